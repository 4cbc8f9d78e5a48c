//! Where settings, client storage and share blobs live on disk.
//!
//! The client keeps two files side by side in the platform config dir
//! (`~/.config/read-for-me/` on Linux): `settings.toml` and `storage.json`.
//! The proxy writes share blobs under the local data dir
//! (`~/.local/share/read-for-me/blobs/` on Linux) unless `[share] dir` says
//! otherwise.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "read-for-me";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub settings_file: PathBuf,
    /// Result cache, usage counter and the user's API key.
    pub storage_file: PathBuf,
    /// Default root of the share blob store.
    pub share_dir: PathBuf,
}

impl AppPaths {
    /// Platform locations from `dirs`, or the working directory where the
    /// platform has none.
    pub fn new() -> Self {
        let config_root = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        let data_root = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::under(&config_root, &data_root)
    }

    /// Lay the app's files out below explicit config and data roots.
    pub fn under(config_root: &Path, data_root: &Path) -> Self {
        let config_dir = config_root.join(APP_DIR);
        Self {
            settings_file: config_dir.join("settings.toml"),
            storage_file: config_dir.join("storage.json"),
            share_dir: data_root.join(APP_DIR).join("blobs"),
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_files_share_one_directory() {
        let paths = AppPaths::under(Path::new("/cfg"), Path::new("/data"));

        assert_eq!(paths.settings_file, Path::new("/cfg/read-for-me/settings.toml"));
        assert_eq!(paths.storage_file, Path::new("/cfg/read-for-me/storage.json"));
        assert_eq!(paths.share_dir, Path::new("/data/read-for-me/blobs"));
    }

    #[test]
    fn platform_paths_end_in_the_app_dir() {
        let paths = AppPaths::new();
        assert!(paths
            .storage_file
            .parent()
            .is_some_and(|dir| dir.ends_with(APP_DIR)));
        assert!(paths.share_dir.ends_with("read-for-me/blobs"));
    }
}

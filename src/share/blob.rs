//! Blob store port: put, list by prefix, get by pathname.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::ShareError;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `body` at `pathname`, replacing any existing blob.
    async fn put(&self, pathname: &str, body: Vec<u8>) -> Result<(), ShareError>;

    /// Pathnames starting with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, ShareError>;

    /// Blob contents, or `None` if nothing is stored at `pathname`.
    async fn get(&self, pathname: &str) -> Result<Option<Vec<u8>>, ShareError>;
}

// ---------------------------------------------------------------------------
// FsBlobStore
// ---------------------------------------------------------------------------

/// Blobs as files under a root directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a pathname inside the root, refusing anything that could
    /// escape it.
    fn resolve(&self, pathname: &str) -> Result<PathBuf, ShareError> {
        let relative = Path::new(pathname);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || pathname.is_empty() {
            return Err(ShareError::InvalidPath(pathname.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, pathname: &str, body: Vec<u8>) -> Result<(), ShareError> {
        let path = self.resolve(pathname)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, body).await?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, ShareError> {
        let (dir, name_prefix) = match prefix.rsplit_once('/') {
            Some((dir, name)) => (dir, name),
            None => ("", prefix),
        };
        let dir_path = if dir.is_empty() {
            self.root.clone()
        } else {
            self.resolve(dir)?
        };

        let mut entries = match tokio::fs::read_dir(&dir_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with(name_prefix) {
                found.push(if dir.is_empty() {
                    name
                } else {
                    format!("{dir}/{name}")
                });
            }
        }
        found.sort();
        Ok(found)
    }

    async fn get(&self, pathname: &str) -> Result<Option<Vec<u8>>, ShareError> {
        let path = self.resolve(pathname)?;
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryBlobStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, pathname: &str, body: Vec<u8>) -> Result<(), ShareError> {
        self.blobs.lock().unwrap().insert(pathname.to_string(), body);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, ShareError> {
        Ok(self
            .blobs
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn get(&self, pathname: &str) -> Result<Option<Vec<u8>>, ShareError> {
        Ok(self.blobs.lock().unwrap().get(pathname).cloned())
    }
}

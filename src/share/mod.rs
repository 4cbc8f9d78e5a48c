//! Share links: persist a result under a short identifier.
//!
//! Shares hold text, pinyin and words only; audio is never shared. They are
//! stored as `shares/<id>.json` in a [`BlobStore`] and looked up by prefix,
//! then by exact pathname.

pub mod blob;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::WordEntry;
use crate::payload::ResultPayload;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};

const SHARE_PREFIX: &str = "shares/";
const ID_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("nothing to share: text is empty")]
    EmptyText,

    #[error("invalid blob path: {0}")]
    InvalidPath(String),

    #[error("blob store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("share payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// What a share link carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharePayload {
    pub text: String,
    #[serde(default)]
    pub pinyin: Option<String>,
    #[serde(default)]
    pub words: Option<Vec<WordEntry>>,
}

impl From<&ResultPayload> for SharePayload {
    fn from(payload: &ResultPayload) -> Self {
        Self {
            text: payload.text.clone(),
            pinyin: payload.pinyin.clone(),
            words: payload.words.clone(),
        }
    }
}

impl From<SharePayload> for ResultPayload {
    fn from(share: SharePayload) -> Self {
        ResultPayload {
            text: share.text,
            pinyin: share.pinyin,
            words: share.words,
            ..ResultPayload::default()
        }
    }
}

/// Reduce a user-supplied identifier to a lowercase alphanumeric token.
///
/// ```
/// use read_for_me::share::sanitize_id;
///
/// assert_eq!(sanitize_id(" AbC-12/../x "), "abc12x");
/// ```
pub fn sanitize_id(id: &str) -> String {
    id.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// A fresh 10-character lowercase alphanumeric identifier.
pub fn new_share_id() -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(ID_LEN)
        .collect()
}

fn pathname(id: &str) -> String {
    format!("{SHARE_PREFIX}{id}.json")
}

#[derive(Clone)]
pub struct ShareStore {
    blobs: Arc<dyn BlobStore>,
}

impl ShareStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Persist `payload` and return its identifier.
    pub async fn save(&self, payload: &SharePayload) -> Result<String, ShareError> {
        let text = payload.text.trim();
        if text.is_empty() {
            return Err(ShareError::EmptyText);
        }
        let stored = SharePayload {
            text: text.to_string(),
            ..payload.clone()
        };
        let id = new_share_id();
        self.blobs
            .put(&pathname(&id), serde_json::to_vec(&stored)?)
            .await?;
        log::info!("share: saved {id}");
        Ok(id)
    }

    /// Load a share verbatim; `None` for unknown or unusable identifiers.
    pub async fn load(&self, id: &str) -> Result<Option<SharePayload>, ShareError> {
        let id = sanitize_id(id);
        if id.is_empty() {
            return Ok(None);
        }
        let wanted = pathname(&id);
        let listed = self
            .blobs
            .list(&format!("{SHARE_PREFIX}{id}"))
            .await?;
        if !listed.iter().any(|p| *p == wanted) {
            return Ok(None);
        }
        let Some(body) = self.blobs.get(&wanted).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn nihao() -> SharePayload {
        SharePayload {
            text: "你好".into(),
            pinyin: Some("nǐ hǎo".into()),
            words: Some(vec![WordEntry::new("你好", "nǐ hǎo", "hello")]),
        }
    }

    #[test]
    fn ids_are_short_lowercase_alphanumeric() {
        let id = new_share_id();
        assert_eq!(id.len(), ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_ne!(new_share_id(), id);
    }

    #[tokio::test]
    async fn save_then_load_returns_text_exactly() {
        let shares = ShareStore::new(Arc::new(MemoryBlobStore::new()));
        let id = shares.save(&nihao()).await.unwrap();

        let loaded = shares.load(&id).await.unwrap().expect("share exists");
        assert_eq!(loaded.text, "你好");
        assert_eq!(loaded, nihao());
    }

    #[tokio::test]
    async fn load_sanitizes_the_identifier() {
        let shares = ShareStore::new(Arc::new(MemoryBlobStore::new()));
        let id = shares.save(&nihao()).await.unwrap();

        let noisy = format!(" {}/ ", id.to_ascii_uppercase());
        assert!(shares.load(&noisy).await.unwrap().is_some());
        assert!(shares.load("../../").await.unwrap().is_none());
        assert!(shares.load("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prefix_of_an_id_does_not_match() {
        let shares = ShareStore::new(Arc::new(MemoryBlobStore::new()));
        let id = shares.save(&nihao()).await.unwrap();
        assert!(shares.load(&id[..4]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let shares = ShareStore::new(Arc::new(MemoryBlobStore::new()));
        let payload = SharePayload {
            text: "   ".into(),
            ..SharePayload::default()
        };
        assert!(matches!(
            shares.save(&payload).await,
            Err(ShareError::EmptyText)
        ));
    }

    #[tokio::test]
    async fn works_against_the_filesystem() {
        let dir = tempdir().expect("temp dir");
        let shares = ShareStore::new(Arc::new(FsBlobStore::new(dir.path())));
        let id = shares.save(&nihao()).await.unwrap();

        assert!(dir.path().join("shares").join(format!("{id}.json")).exists());
        assert_eq!(shares.load(&id).await.unwrap().unwrap().text, "你好");
    }

    #[test]
    fn share_drops_audio_and_usage() {
        let payload = ResultPayload {
            text: "你好".into(),
            pinyin: Some("nǐ hǎo".into()),
            audio_base64: Some("SUQz".into()),
            ..ResultPayload::default()
        };
        let share = SharePayload::from(&payload);
        let back = ResultPayload::from(share);
        assert!(back.audio_base64.is_none());
        assert_eq!(back.pinyin.as_deref(), Some("nǐ hǎo"));
    }
}

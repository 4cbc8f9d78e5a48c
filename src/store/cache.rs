//! Result cache keyed by the exact trimmed input text.
//!
//! Writes are best-effort: a payload that fails
//! [`ResultPayload::is_cacheable`] is silently skipped, and storage or
//! serialization failures are logged and swallowed. Reads re-check the same
//! gate, so an entry that would look like a failed call is never served.

use std::sync::Arc;

use super::kv::KeyValueStore;
use crate::payload::ResultPayload;

/// Namespace shared by every key this crate writes.
pub const KEY_PREFIX: &str = "readforme:";

/// Cache key for `text`. No normalization beyond the caller's trim.
pub fn cache_key(text: &str) -> String {
    format!("{KEY_PREFIX}{text}")
}

#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn KeyValueStore>,
}

impl ResultCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Look up a validated entry for `text`.
    pub fn get(&self, text: &str) -> Option<ResultPayload> {
        let raw = self.store.get(&cache_key(text))?;
        let mut payload: ResultPayload = match serde_json::from_str(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                log::debug!("cache: unreadable entry ignored: {e}");
                return None;
            }
        };
        if payload.text.is_empty() {
            payload.text = text.to_string();
        }
        if payload.text != text || !payload.is_cacheable() {
            log::debug!("cache: entry for {} chars failed validation", text.chars().count());
            return None;
        }
        Some(payload)
    }

    /// Store `payload` under `text` if it passes the validity gate.
    ///
    /// Returns whether the entry was written.
    pub fn put(&self, text: &str, payload: &ResultPayload) -> bool {
        if payload.text != text || !payload.is_cacheable() {
            log::debug!("cache: skipping write, payload not cacheable");
            return false;
        }
        let entry = ResultPayload {
            usage: None,
            cached: false,
            ..payload.clone()
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("cache: serialization failed: {e}");
                return false;
            }
        };
        match self.store.set(&cache_key(text), &raw) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("cache: write failed: {e}");
                false
            }
        }
    }

    /// Attach audio to an existing entry in place.
    pub fn upgrade_audio(&self, text: &str, audio_base64: &str) -> bool {
        let Some(mut payload) = self.get(text) else {
            return false;
        };
        payload.audio_base64 = Some(audio_base64.to_string());
        self.put(text, &payload)
    }
}

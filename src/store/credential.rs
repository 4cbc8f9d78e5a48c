//! The optional user-supplied API key.

use std::sync::Arc;

use super::cache::KEY_PREFIX;
use super::kv::{KeyValueStore, StoreError};

const CREDENTIAL_KEY: &str = "apiKey";

#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key() -> String {
        format!("{KEY_PREFIX}{CREDENTIAL_KEY}")
    }

    /// The stored key, if one is set and non-blank.
    pub fn get(&self) -> Option<String> {
        self.store
            .get(&Self::key())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    /// Store `key`; a blank key clears the credential instead.
    pub fn set(&self, key: &str) -> Result<(), StoreError> {
        let key = key.trim();
        if key.is_empty() {
            return self.clear();
        }
        self.store.set(&Self::key(), key)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(&Self::key())
    }
}

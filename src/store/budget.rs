//! Advisory token budget for the service path.
//!
//! The counter only ever grows until [`UsageBudget::reset`]. It is shared
//! storage, so concurrent writers race last-write-wins; that is acceptable
//! for an advisory limit.

use std::sync::Arc;

use super::cache::KEY_PREFIX;
use super::kv::KeyValueStore;

const USAGE_KEY: &str = "usage";

#[derive(Clone)]
pub struct UsageBudget {
    store: Arc<dyn KeyValueStore>,
    ceiling: u64,
}

impl UsageBudget {
    pub fn new(store: Arc<dyn KeyValueStore>, ceiling: u64) -> Self {
        Self { store, ceiling }
    }

    fn key() -> String {
        format!("{KEY_PREFIX}{USAGE_KEY}")
    }

    /// Tokens consumed so far; unreadable values count as zero.
    pub fn used(&self) -> u64 {
        self.store
            .get(&Self::key())
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Add `tokens` and return the new total.
    pub fn add(&self, tokens: u64) -> u64 {
        let total = self.used().saturating_add(tokens);
        if let Err(e) = self.store.set(&Self::key(), &total.to_string()) {
            log::warn!("budget: failed to persist usage: {e}");
        }
        total
    }

    pub fn over_limit(&self) -> bool {
        self.used() >= self.ceiling
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    pub fn remaining(&self) -> u64 {
        self.ceiling.saturating_sub(self.used())
    }

    /// Explicit out-of-band reset.
    pub fn reset(&self) {
        if let Err(e) = self.store.remove(&Self::key()) {
            log::warn!("budget: failed to reset usage: {e}");
        }
    }
}

//! Client-side persistent state.
//!
//! Everything the client remembers between runs goes through one
//! [`KeyValueStore`]:
//!
//! | Key                  | Owner               |
//! |----------------------|---------------------|
//! | `readforme:<text>`   | [`ResultCache`]     |
//! | `readforme:usage`    | [`UsageBudget`]     |
//! | `readforme:apiKey`   | [`CredentialStore`] |

pub mod budget;
pub mod cache;
pub mod credential;
pub mod kv;

pub use budget::UsageBudget;
pub use cache::{cache_key, ResultCache, KEY_PREFIX};
pub use credential::CredentialStore;
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};

//! Request routes the orchestrator can take.
//!
//! ```text
//!                       ┌──────────────────────────┐
//!   Route::Service ───▶ │ ProxyBackend  → POST /api │ ─▶ proxy injects GMI_API_KEY
//!                       └──────────────────────────┘
//!                       ┌──────────────────────────┐
//!   Route::Direct  ───▶ │ RemoteBackend(user key)   │ ─▶ completion + speech endpoints
//!                       └──────────────────────────┘
//! ```
//!
//! Both sides implement [`Backend`]; the proxy itself serves requests with a
//! [`RemoteBackend`] built around the service credential.

pub mod proxy;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::llm::{Completion, TokenUsage, WordEntry};

pub use proxy::ProxyBackend;
pub use remote::{ApiConnector, RemoteBackend};

/// Whose credential pays for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The service credential; charged against the usage budget.
    Service,
    /// The user's own credential; never charged.
    Direct,
}

/// A parsed word breakdown with the usage of the completion behind it.
///
/// `words` is empty when the completion did not parse; callers validate the
/// list with [`crate::llm::is_complete_list`] before showing it.
#[derive(Debug, Clone, PartialEq)]
pub struct WordsCompletion {
    pub words: Vec<WordEntry>,
    pub usage: Option<TokenUsage>,
}

/// The three independent remote operations behind one submission.
#[async_trait]
pub trait Backend: Send + Sync {
    fn route(&self) -> Route;

    async fn pinyin(&self, text: &str) -> Result<Completion, RemoteError>;

    async fn words(&self, text: &str) -> Result<WordsCompletion, RemoteError>;

    async fn speech(&self, text: &str) -> Result<Vec<u8>, RemoteError>;
}

/// Builds a direct-route backend for a user credential.
pub trait DirectConnector: Send + Sync {
    fn connect(&self, credential: &str) -> Arc<dyn Backend>;
}

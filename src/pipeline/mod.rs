//! Request orchestration: one text in, one displayed result out.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator::submit(text)
//!        │
//!        ├─ trim, validate                         → InvalidInput
//!        ├─ same text as the displayed result       → Result (no work)
//!        ├─ ResultCache hit                         → Result (cached)
//!        │        └─ audio missing → tokio::spawn(backfill)
//!        ├─ no user key and UsageBudget spent       → LimitReached
//!        └─ Backend (direct with key, else service)
//!              join!(pinyin, words, speech)         → Loading
//!              validate, merge, charge, publish     → Result / Error
//!              ResultCache::put (if cacheable)
//!
//! SharedState (Arc<Mutex<AppState>>) ←── read by the front end
//! ```
//!
//! Every publish is tagged with the generation of the submission that
//! produced it; results from a superseded submission are returned to their
//! caller but never displayed.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use read_for_me::backend::{ApiConnector, ProxyBackend};
//! use read_for_me::config::AppConfig;
//! use read_for_me::pipeline::{new_shared_state, Orchestrator};
//! use read_for_me::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let orchestrator = Orchestrator::new(
//!         new_shared_state(),
//!         Arc::new(MemoryStore::new()),
//!         config.budget.ceiling,
//!         Arc::new(ProxyBackend::from_config(&config.service)),
//!         Arc::new(ApiConnector::new(&config)),
//!     );
//!
//!     match orchestrator.submit("你好世界").await {
//!         Ok(payload) => println!("{:?}", payload.pinyin),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{InputProblem, Orchestrator, SubmitError};
pub use state::{new_shared_state, AppState, PipelineState, SharedState};

//! Pipeline state machine and shared display state.
//!
//! [`AppState`] is the single source of truth for what a front end shows:
//! the current phase, the displayed result and any error message.
//! [`SharedState`] is a type alias for `Arc<Mutex<AppState>>`, cheap to clone
//! and safe to share across tasks.

use std::sync::{Arc, Mutex};

use crate::payload::ResultPayload;

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// Phases of one submission.
///
/// ```text
/// Idle ──submit──▶ Loading ──ok──▶ Result
///                          ──err─▶ Error
///      ──submit (no key, budget spent)──▶ LimitReached
/// cache hit / repeated text ──▶ Result
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PipelineState {
    #[default]
    Idle,

    /// Remote calls are in flight.
    Loading,

    /// A payload is displayed.
    Result,

    /// A recoverable error; the next submission starts over.
    Error,

    /// The free budget is spent and no user key is set. Front ends should
    /// offer credential entry rather than a plain error.
    LimitReached,
}

impl PipelineState {
    /// ```
    /// use read_for_me::pipeline::PipelineState;
    ///
    /// assert!(PipelineState::Loading.is_busy());
    /// assert!(!PipelineState::LimitReached.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, PipelineState::Loading)
    }

    /// Short label for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Loading => "Loading",
            PipelineState::Result => "Done",
            PipelineState::Error => "Error",
            PipelineState::LimitReached => "Limit reached",
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub pipeline: PipelineState,

    /// The displayed result. Kept while a newer submission is loading so a
    /// repeated submit of the same text can be answered from memory.
    pub current: Option<ResultPayload>,

    /// Audio for `current` is being fetched in the background.
    pub audio_pending: bool,

    /// Set when `pipeline` is `Error` or `LimitReached`.
    pub error_message: Option<String>,
}

/// Thread-safe handle to [`AppState`].
///
/// Lock for a short critical section; never hold the lock across `.await`.
pub type SharedState = Arc<Mutex<AppState>>;

pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(AppState::default()))
}

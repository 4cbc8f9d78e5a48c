//! Failure kinds shared by every remote call.
//!
//! Remote calls never panic or propagate past their call site: each client
//! returns a [`RemoteError`] value so the orchestrator can inspect one
//! branch's failure without disturbing the others.

use std::fmt;

use thiserror::Error;

/// Which remote step produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Chat-completion request (pinyin or word breakdown).
    Completion,
    /// First speech step: submitting the synthesis job.
    SpeechSubmit,
    /// Second speech step: downloading the synthesised audio.
    SpeechDownload,
    /// The application's own proxy (service path).
    Proxy,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Endpoint::Completion => "completion",
            Endpoint::SpeechSubmit => "speech submit",
            Endpoint::SpeechDownload => "audio download",
            Endpoint::Proxy => "service",
        };
        f.write_str(label)
    }
}

/// Errors returned by remote clients and backends.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    /// No credential is available for this route.
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    /// Network or connection failure.
    #[error("{endpoint} request failed: {message}")]
    Transport { endpoint: Endpoint, message: String },

    /// The call did not complete within the configured timeout.
    #[error("{endpoint} request timed out")]
    Timeout { endpoint: Endpoint },

    /// The remote answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}: {message}")]
    Status {
        endpoint: Endpoint,
        status: u16,
        message: String,
    },

    /// The response envelope or completion body could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The speech job finished without a recognisable audio URL.
    #[error("no audio URL in response")]
    NoAudioUrl,

    /// The proxy reported an upstream failure in its response body.
    #[error("{0}")]
    Service(String),
}

impl RemoteError {
    /// Map a `reqwest` failure, keeping timeouts distinguishable.
    pub fn from_reqwest(endpoint: Endpoint, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout { endpoint }
        } else {
            RemoteError::Transport {
                endpoint,
                message: e.to_string(),
            }
        }
    }

    /// `true` for 401/403 answers, i.e. the credential was rejected.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(
            self,
            RemoteError::Status {
                status: 401 | 403,
                ..
            }
        )
    }
}

/// Truncate `s` to at most `max` characters on a char boundary.
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

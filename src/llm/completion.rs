//! Core `CompletionClient` trait and `ApiCompletionClient` implementation.
//!
//! `ApiCompletionClient` calls an OpenAI-compatible `/v1/chat/completions`
//! endpoint with a fixed system prompt and zero temperature. All connection
//! details come from [`CompletionConfig`]; the credential is passed in
//! separately so the same client serves the service key and user keys.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::CompletionConfig;
use crate::error::{truncate_chars, Endpoint, RemoteError};

/// Longest slice of a raw error body carried into a status error.
const ERROR_BODY_CHARS: usize = 150;

// ---------------------------------------------------------------------------
// TokenUsage / Completion
// ---------------------------------------------------------------------------

/// Token accounting reported by the completion endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Sum two optional usage records; `None` only when both are absent.
    pub fn combine(a: Option<TokenUsage>, b: Option<TokenUsage>) -> Option<TokenUsage> {
        match (a, b) {
            (None, None) => None,
            (a, b) => {
                let a = a.unwrap_or_default();
                let b = b.unwrap_or_default();
                Some(TokenUsage {
                    prompt_tokens: a.prompt_tokens.saturating_add(b.prompt_tokens),
                    completion_tokens: a.completion_tokens.saturating_add(b.completion_tokens),
                    total_tokens: a.total_tokens.saturating_add(b.total_tokens),
                })
            }
        }
    }
}

/// A single parsed completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// First choice's message content, trimmed.
    pub content: String,
    pub usage: Option<TokenUsage>,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// CompletionClient trait
// ---------------------------------------------------------------------------

/// Async trait for chat-completion backends.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn CompletionClient>`).
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        max_tokens: u32,
    ) -> Result<Completion, RemoteError>;
}

// ---------------------------------------------------------------------------
// ApiCompletionClient
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct ApiCompletionClient {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl ApiCompletionClient {
    /// Build a client from config and an optional bearer credential.
    ///
    /// A blank credential counts as absent: every call then fails with
    /// [`RemoteError::NotConfigured`] without touching the network.
    pub fn from_config(config: &CompletionConfig, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            url: format!(
                "{}/v1/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            model: config.model.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl CompletionClient for ApiCompletionClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        max_tokens: u32,
    ) -> Result<Completion, RemoteError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(RemoteError::NotConfigured("completion API key"))?;

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            temperature: 0.0,
            max_tokens,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(Endpoint::Completion, e))?;

        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|e| RemoteError::from_reqwest(Endpoint::Completion, e))?;

        if status != 200 {
            return Err(RemoteError::Status {
                endpoint: Endpoint::Completion,
                status,
                message: error_message(&raw),
            });
        }

        parse_envelope(&raw)
    }
}

/// Pull a human-readable message out of an error body.
///
/// Prefers `error.message`, then a top-level `message`, then the raw body
/// cut to [`ERROR_BODY_CHARS`].
pub(crate) fn error_message(raw: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(raw).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v["error"]["message"]
                .as_str()
                .or_else(|| v["message"].as_str())
        })
        .map(str::to_string)
        .unwrap_or_else(|| truncate_chars(raw, ERROR_BODY_CHARS).to_string())
}

fn parse_envelope(raw: &str) -> Result<Completion, RemoteError> {
    let envelope: ChatCompletionResponse =
        serde_json::from_str(raw).map_err(|e| RemoteError::Malformed(e.to_string()))?;

    let choice = envelope
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RemoteError::Malformed("no choices in completion".into()))?;

    let content = choice
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| RemoteError::Malformed("choice has no message content".into()))?;

    Ok(Completion {
        content: content.trim().to_string(),
        usage: envelope.usage,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

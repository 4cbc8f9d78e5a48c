//! `SpeechSynthesizer` trait and the queue-based `ApiSpeechClient`.
//!
//! Synthesis is a two-request exchange:
//!
//! ```text
//! POST submit_url {model, payload}  ──▶ {outcome: {media: [{url}]}}
//!                                        or {outcome: {audio_url}}
//! GET  <url>                        ──▶ audio bytes
//! ```
//!
//! Each step reports its own failures ([`Endpoint::SpeechSubmit`] /
//! [`Endpoint::SpeechDownload`]). There are no retries.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SpeechConfig;
use crate::error::{truncate_chars, Endpoint, RemoteError};

const ERROR_BODY_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Voice parameters sent with every synthesis job.
#[derive(Debug, Serialize)]
pub struct SpeechRequest<'a> {
    pub text: &'a str,
    pub voice_id: &'a str,
    pub audio_encoding: &'a str,
    pub sample_rate_hertz: u32,
    pub speaking_rate: f32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    model: &'a str,
    payload: SpeechRequest<'a>,
}

#[derive(Debug, Default, Deserialize)]
struct QueueResponse {
    outcome: Option<Outcome>,
}

#[derive(Debug, Default, Deserialize)]
struct Outcome {
    #[serde(default)]
    media: Vec<Media>,
    audio_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Media {
    url: Option<String>,
}

/// Pick the audio URL out of a submit response: first media entry, then
/// the direct `audio_url` field.
fn extract_audio_url(body: &str) -> Result<String, RemoteError> {
    let response: QueueResponse = serde_json::from_str(body)
        .map_err(|e| RemoteError::Malformed(format!("speech submit response: {e}")))?;
    let outcome = response.outcome.unwrap_or_default();
    outcome
        .media
        .into_iter()
        .next()
        .and_then(|m| m.url)
        .or(outcome.audio_url)
        .filter(|url| !url.is_empty())
        .ok_or(RemoteError::NoAudioUrl)
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Async trait for text-to-speech backends.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and return the encoded audio bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, RemoteError>;
}

// ---------------------------------------------------------------------------
// ApiSpeechClient
// ---------------------------------------------------------------------------

/// Submits jobs to the hosted request queue and downloads the result.
pub struct ApiSpeechClient {
    client: reqwest::Client,
    config: SpeechConfig,
    api_key: Option<String>,
}

impl ApiSpeechClient {
    /// Build a client; a blank credential counts as absent.
    pub fn from_config(config: &SpeechConfig, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    async fn submit(&self, key: &str, text: &str) -> Result<String, RemoteError> {
        let body = SubmitBody {
            model: &self.config.model,
            payload: SpeechRequest {
                text,
                voice_id: &self.config.voice_id,
                audio_encoding: &self.config.audio_encoding,
                sample_rate_hertz: self.config.sample_rate_hertz,
                speaking_rate: self.config.speaking_rate,
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(&self.config.submit_url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(Endpoint::SpeechSubmit, e))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| RemoteError::from_reqwest(Endpoint::SpeechSubmit, e))?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                endpoint: Endpoint::SpeechSubmit,
                status: status.as_u16(),
                message: truncate_chars(&raw, ERROR_BODY_CHARS).to_string(),
            });
        }

        extract_audio_url(&raw)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(Endpoint::SpeechDownload, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                endpoint: Endpoint::SpeechDownload,
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::from_reqwest(Endpoint::SpeechDownload, e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for ApiSpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, RemoteError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(RemoteError::NotConfigured("speech API key"))?;

        let url = self.submit(key, text).await?;
        log::debug!("tts: job finished, downloading audio");
        self.download(&url).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Service-path backend: calls the application's own proxy.
//!
//! The proxy holds the service credential, so requests from here carry
//! none. One mode per branch keeps the three calls independent.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::{Backend, Route, WordsCompletion};
use crate::config::ServiceConfig;
use crate::error::{truncate_chars, Endpoint, RemoteError};
use crate::llm::Completion;
use crate::server::protocol::{ApiRequest, ApiResponse, Mode};
use crate::share::SharePayload;

const ERROR_BODY_CHARS: usize = 200;

pub struct ProxyBackend {
    client: reqwest::Client,
    api_url: String,
}

impl ProxyBackend {
    pub fn from_config(config: &ServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_url: format!("{}/api", config.base_url.trim_end_matches('/')),
        }
    }

    async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, RemoteError> {
        let response = self
            .client
            .post(&self.api_url)
            .json(request)
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(Endpoint::Proxy, e))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| RemoteError::from_reqwest(Endpoint::Proxy, e))?;

        let parsed = serde_json::from_str::<ApiResponse>(&raw);
        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| truncate_chars(&raw, ERROR_BODY_CHARS).to_string());
            return Err(RemoteError::Status {
                endpoint: Endpoint::Proxy,
                status: status.as_u16(),
                message,
            });
        }

        let body = parsed.map_err(|e| RemoteError::Malformed(format!("proxy response: {e}")))?;
        match &body.error {
            Some(error) if !body.ok => Err(RemoteError::Service(error.clone())),
            _ => Ok(body),
        }
    }

    /// Persist a share through the proxy and return its identifier.
    pub async fn save_share(&self, share: &SharePayload) -> Result<String, RemoteError> {
        let request = ApiRequest {
            mode: Mode::ShareSave,
            text: Some(share.text.clone()),
            pinyin: share.pinyin.clone(),
            words: share.words.clone(),
            ..ApiRequest::default()
        };
        self.call(&request)
            .await?
            .id
            .ok_or_else(|| RemoteError::Malformed("share saved without an id".into()))
    }

    /// Fetch a share by identifier; `None` if the proxy does not know it.
    pub async fn load_share(&self, id: &str) -> Result<Option<SharePayload>, RemoteError> {
        let request = ApiRequest {
            mode: Mode::ShareLoad,
            id: Some(id.to_string()),
            ..ApiRequest::default()
        };
        let body = match self.call(&request).await {
            Ok(body) => body,
            Err(RemoteError::Service(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(body.text.map(|text| SharePayload {
            text,
            pinyin: body.pinyin,
            words: body.words,
        }))
    }
}

#[async_trait]
impl Backend for ProxyBackend {
    fn route(&self) -> Route {
        Route::Service
    }

    async fn pinyin(&self, text: &str) -> Result<Completion, RemoteError> {
        let body = self.call(&ApiRequest::new(Mode::Pinyin, text)).await?;
        let content = body
            .pinyin
            .ok_or_else(|| RemoteError::Malformed("proxy returned no pinyin".into()))?;
        Ok(Completion {
            content,
            usage: body.usage,
        })
    }

    async fn words(&self, text: &str) -> Result<WordsCompletion, RemoteError> {
        let body = self.call(&ApiRequest::new(Mode::Breakdown, text)).await?;
        let words = body
            .words
            .ok_or_else(|| RemoteError::Malformed("proxy returned no words".into()))?;
        Ok(WordsCompletion {
            words,
            usage: body.usage,
        })
    }

    async fn speech(&self, text: &str) -> Result<Vec<u8>, RemoteError> {
        let body = self.call(&ApiRequest::new(Mode::Tts, text)).await?;
        let audio = body
            .audio_base64
            .ok_or_else(|| RemoteError::Malformed("proxy returned no audio".into()))?;
        BASE64
            .decode(audio)
            .map_err(|e| RemoteError::Malformed(format!("audio is not base64: {e}")))
    }
}

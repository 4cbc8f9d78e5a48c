//! Backend that talks to the hosted endpoints with a given credential.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Backend, DirectConnector, Route, WordsCompletion};
use crate::config::{AppConfig, CompletionConfig};
use crate::error::RemoteError;
use crate::llm::{parse_word_list, ApiCompletionClient, Completion, CompletionClient, PromptKind};
use crate::tts::{ApiSpeechClient, SpeechSynthesizer};

pub struct RemoteBackend {
    route: Route,
    completion: Arc<dyn CompletionClient>,
    speech: Arc<dyn SpeechSynthesizer>,
    limits: CompletionConfig,
}

impl RemoteBackend {
    pub fn new(
        route: Route,
        completion: Arc<dyn CompletionClient>,
        speech: Arc<dyn SpeechSynthesizer>,
        limits: &CompletionConfig,
    ) -> Self {
        Self {
            route,
            completion,
            speech,
            limits: limits.clone(),
        }
    }

    /// HTTP clients for both endpoints sharing one credential.
    pub fn from_config(route: Route, config: &AppConfig, credential: Option<String>) -> Self {
        let completion = ApiCompletionClient::from_config(&config.completion, credential.clone());
        let speech = ApiSpeechClient::from_config(&config.speech, credential);
        Self::new(
            route,
            Arc::new(completion),
            Arc::new(speech),
            &config.completion,
        )
    }

    async fn complete(&self, kind: PromptKind, text: &str) -> Result<Completion, RemoteError> {
        self.completion
            .complete(kind.system_prompt(), text, kind.max_tokens(&self.limits))
            .await
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    fn route(&self) -> Route {
        self.route
    }

    async fn pinyin(&self, text: &str) -> Result<Completion, RemoteError> {
        self.complete(PromptKind::Pinyin, text).await
    }

    /// An unparseable breakdown comes back as an empty list so the tokens
    /// it consumed are still reported.
    async fn words(&self, text: &str) -> Result<WordsCompletion, RemoteError> {
        let completion = self.complete(PromptKind::Words, text).await?;
        let words = parse_word_list(&completion.content).unwrap_or_else(|e| {
            log::warn!("backend: {e}");
            Vec::new()
        });
        Ok(WordsCompletion {
            words,
            usage: completion.usage,
        })
    }

    async fn speech(&self, text: &str) -> Result<Vec<u8>, RemoteError> {
        self.speech.synthesize(text).await
    }
}

/// Creates direct-route [`RemoteBackend`]s from the app config.
pub struct ApiConnector {
    config: AppConfig,
}

impl ApiConnector {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl DirectConnector for ApiConnector {
    fn connect(&self, credential: &str) -> Arc<dyn Backend> {
        Arc::new(RemoteBackend::from_config(
            Route::Direct,
            &self.config,
            Some(credential.to_string()),
        ))
    }
}

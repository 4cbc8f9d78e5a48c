//! The orchestrator: cache vs. remote decision, concurrent fan-out,
//! validation, merge and write-through.
//!
//! # Submission flow
//!
//! ```text
//! submit(text)
//!   └─▶ generation += 1
//!         ├─ cache hit      → publish (cached)  [Result]
//!         │     └─ no audio → spawn backfill → upgrade cache, patch display
//!         └─ cache miss     → join!(pinyin, words, speech)  [Loading]
//!               ├─ direct route + 401/403 → InvalidCredential  [Error]
//!               ├─ nothing usable         → Remote              [Error]
//!               └─ otherwise              → charge, publish, cache  [Result]
//! ```
//!
//! Remote failures are values: a failed branch leaves its field empty and
//! never cancels the other two.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::backend::{Backend, DirectConnector, Route};
use crate::error::RemoteError;
use crate::llm::{is_complete_list, TokenUsage};
use crate::payload::{is_valid_pinyin, ResultPayload};
use crate::script::contains_han;
use crate::store::{CredentialStore, KeyValueStore, ResultCache, StoreError, UsageBudget};

use super::state::{PipelineState, SharedState};

// ---------------------------------------------------------------------------
// SubmitError
// ---------------------------------------------------------------------------

/// Why the input was rejected before any remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputProblem {
    Empty,
    NotChinese,
}

impl std::fmt::Display for InputProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputProblem::Empty => write!(f, "Please paste some text."),
            InputProblem::NotChinese => write!(f, "Please paste some Chinese text."),
        }
    }
}

/// The four outcomes a front end must tell apart.
///
/// `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error("{0}")]
    InvalidInput(InputProblem),

    /// The free budget is spent; offer credential entry.
    #[error("Free usage limit reached. Add your own API key to continue.")]
    QuotaExceeded,

    #[error("Your API key was rejected. Check it and try again.")]
    InvalidCredential,

    #[error("Something went wrong ({0}). Please try again.")]
    Remote(String),
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    state: SharedState,
    cache: ResultCache,
    budget: UsageBudget,
    credential: CredentialStore,
    service: Arc<dyn Backend>,
    direct: Arc<dyn DirectConnector>,
    generation: Arc<AtomicU64>,
    backfill: Mutex<Option<JoinHandle<()>>>,
}

impl Orchestrator {
    /// Create an orchestrator over one client store.
    ///
    /// * `store`   — backs the result cache, usage counter and credential.
    /// * `ceiling` — service-path token budget.
    /// * `service` — backend used when no user credential is set.
    /// * `direct`  — builds a backend around the user credential.
    pub fn new(
        state: SharedState,
        store: Arc<dyn KeyValueStore>,
        ceiling: u64,
        service: Arc<dyn Backend>,
        direct: Arc<dyn DirectConnector>,
    ) -> Self {
        Self {
            state,
            cache: ResultCache::new(store.clone()),
            budget: UsageBudget::new(store.clone(), ceiling),
            credential: CredentialStore::new(store),
            service,
            direct,
            generation: Arc::new(AtomicU64::new(0)),
            backfill: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    pub fn budget(&self) -> &UsageBudget {
        &self.budget
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn set_credential(&self, key: &str) -> Result<(), StoreError> {
        self.credential.set(key)
    }

    pub fn clear_credential(&self) -> Result<(), StoreError> {
        self.credential.clear()
    }

    pub fn has_credential(&self) -> bool {
        self.credential.get().is_some()
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Turn `text` into a displayed [`ResultPayload`].
    pub async fn submit(&self, text: &str) -> Result<ResultPayload, SubmitError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let text = text.trim();

        if text.is_empty() {
            return Err(self.fail(generation, SubmitError::InvalidInput(InputProblem::Empty)));
        }
        if !contains_han(text) {
            return Err(self.fail(
                generation,
                SubmitError::InvalidInput(InputProblem::NotChinese),
            ));
        }

        if let Some((last, audio_pending)) = self.displayed_for(text) {
            log::debug!("pipeline: same text as displayed result, no work");
            self.publish(generation, &last, audio_pending);
            return Ok(last);
        }

        let credential = self.credential.get();

        if let Some(mut hit) = self.cache.get(text) {
            log::debug!("pipeline: cache hit");
            hit.cached = true;
            let missing_audio = !hit.has_audio();
            self.publish(generation, &hit, missing_audio);
            if missing_audio {
                let backend = self.backend_for(credential.as_deref());
                self.spawn_backfill(backend, text);
            }
            return Ok(hit);
        }

        if credential.is_none() && self.budget.over_limit() {
            log::info!(
                "pipeline: usage budget spent ({} / {})",
                self.budget.used(),
                self.budget.ceiling()
            );
            return Err(self.fail(generation, SubmitError::QuotaExceeded));
        }

        let backend = self.backend_for(credential.as_deref());
        self.set_pipeline(generation, PipelineState::Loading);
        log::debug!("pipeline: fetching over {:?} route", backend.route());

        let (pinyin, words, speech) = tokio::join!(
            backend.pinyin(text),
            backend.words(text),
            backend.speech(text)
        );

        if backend.route() == Route::Direct {
            let rejected = [pinyin.as_ref().err(), words.as_ref().err(), speech.as_ref().err()]
                .into_iter()
                .flatten()
                .any(RemoteError::is_auth_rejection);
            if rejected {
                return Err(self.fail(generation, SubmitError::InvalidCredential));
            }
        }

        let mut failures: Vec<RemoteError> = Vec::new();
        let mut payload = ResultPayload::new(text);
        let mut pinyin_usage = None;
        let mut words_usage = None;

        match pinyin {
            Ok(completion) => {
                pinyin_usage = completion.usage;
                if is_valid_pinyin(text, &completion.content) {
                    payload.pinyin = Some(completion.content.trim().to_string());
                } else {
                    log::warn!("pipeline: discarding unusable pinyin");
                }
            }
            Err(e) => {
                log::warn!("pipeline: pinyin failed: {e}");
                failures.push(e);
            }
        }

        match words {
            Ok(breakdown) => {
                words_usage = breakdown.usage;
                if is_complete_list(&breakdown.words) {
                    payload.words = Some(breakdown.words);
                } else {
                    log::warn!("pipeline: discarding incomplete word list");
                }
            }
            Err(e) => {
                log::warn!("pipeline: words failed: {e}");
                failures.push(e);
            }
        }

        match speech {
            Ok(bytes) if !bytes.is_empty() => payload.audio_base64 = Some(BASE64.encode(bytes)),
            Ok(_) => log::warn!("pipeline: speech returned no bytes"),
            Err(e) => {
                log::warn!("pipeline: speech failed: {e}");
                failures.push(e);
            }
        }

        payload.usage = TokenUsage::combine(pinyin_usage, words_usage);
        if backend.route() == Route::Service {
            if let Some(usage) = payload.usage {
                let total = self.budget.add(usage.total_tokens);
                log::debug!("pipeline: charged {} tokens, {total} used", usage.total_tokens);
            }
        }

        if !payload.is_renderable() {
            let message = if failures.is_empty() {
                "No usable result.".to_string()
            } else {
                let mut messages: Vec<String> = failures.iter().map(ToString::to_string).collect();
                messages.dedup();
                messages.join("; ")
            };
            return Err(self.fail(generation, SubmitError::Remote(message)));
        }

        self.publish(generation, &payload, false);
        if self.cache.put(text, &payload) {
            log::debug!("pipeline: result cached");
        }
        Ok(payload)
    }

    /// Wait for an in-flight audio backfill, if any.
    pub async fn wait_for_background(&self) {
        let handle = self.backfill.lock().unwrap().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log::warn!("pipeline: backfill task failed: {e}");
            }
        }
    }

    /// Drop the displayed result and return to `Idle`.
    pub fn clear(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut st = self.state.lock().unwrap();
        if self.is_current(generation) {
            st.pipeline = PipelineState::Idle;
            st.current = None;
            st.audio_pending = false;
            st.error_message = None;
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn backend_for(&self, credential: Option<&str>) -> Arc<dyn Backend> {
        match credential {
            Some(key) => self.direct.connect(key),
            None => Arc::clone(&self.service),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// The displayed result for `text` and whether its audio is still coming.
    fn displayed_for(&self, text: &str) -> Option<(ResultPayload, bool)> {
        let st = self.state.lock().unwrap();
        st.current
            .as_ref()
            .filter(|p| p.text == text)
            .map(|p| (p.clone(), st.audio_pending))
    }

    fn publish(&self, generation: u64, payload: &ResultPayload, audio_pending: bool) {
        let mut st = self.state.lock().unwrap();
        if !self.is_current(generation) {
            log::debug!("pipeline: dropping superseded result");
            return;
        }
        st.pipeline = PipelineState::Result;
        st.current = Some(payload.clone());
        st.audio_pending = audio_pending;
        st.error_message = None;
    }

    fn set_pipeline(&self, generation: u64, pipeline: PipelineState) {
        let mut st = self.state.lock().unwrap();
        if self.is_current(generation) {
            st.pipeline = pipeline;
            st.error_message = None;
        }
    }

    /// Record `error` for display and hand it back to the caller.
    fn fail(&self, generation: u64, error: SubmitError) -> SubmitError {
        let pipeline = match error {
            SubmitError::QuotaExceeded => PipelineState::LimitReached,
            _ => PipelineState::Error,
        };
        let mut st = self.state.lock().unwrap();
        if self.is_current(generation) {
            st.pipeline = pipeline;
            st.audio_pending = false;
            st.error_message = Some(error.to_string());
        }
        log::warn!("pipeline error: {error}");
        error
    }

    /// Fetch audio for a cached entry and attach it to the cache and, if
    /// the displayed result is still for the same text, to that result.
    fn spawn_backfill(&self, backend: Arc<dyn Backend>, text: &str) {
        let text = text.to_string();
        let cache = self.cache.clone();
        let state = Arc::clone(&self.state);

        let handle = tokio::spawn(async move {
            let audio = match backend.speech(&text).await {
                Ok(bytes) if !bytes.is_empty() => Some(BASE64.encode(bytes)),
                Ok(_) => None,
                Err(e) => {
                    log::warn!("pipeline: audio backfill failed: {e}");
                    None
                }
            };

            if let Some(audio) = &audio {
                cache.upgrade_audio(&text, audio);
            }

            let mut st = state.lock().unwrap();
            let Some(shown) = st.current.as_mut().filter(|p| p.text == text) else {
                log::debug!("pipeline: backfill finished after the display moved on");
                return;
            };
            if audio.is_some() {
                shown.audio_base64 = audio;
            }
            st.audio_pending = false;
        });

        *self.backfill.lock().unwrap() = Some(handle);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::WordsCompletion;
    use crate::llm::{Completion, WordEntry};
    use crate::pipeline::state::new_shared_state;
    use crate::store::MemoryStore;
    use crate::testing::{nihao_words, rejected, FakeBackend, FakeConnector};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    const CEILING: u64 = 1_000;

    struct Harness {
        orchestrator: Orchestrator,
        service: Arc<FakeBackend>,
        connector: Arc<FakeConnector>,
        store: Arc<MemoryStore>,
    }

    fn harness_with_store(
        service: FakeBackend,
        direct: FakeBackend,
        store: Arc<MemoryStore>,
    ) -> Harness {
        let service = Arc::new(service);
        let connector = Arc::new(FakeConnector::new(direct));
        let orchestrator = Orchestrator::new(
            new_shared_state(),
            store.clone(),
            CEILING,
            service.clone(),
            connector.clone(),
        );
        Harness {
            orchestrator,
            service,
            connector,
            store,
        }
    }

    fn harness(service: FakeBackend) -> Harness {
        harness_with_store(
            service,
            FakeBackend::happy(Route::Direct),
            Arc::new(MemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn empty_and_non_chinese_input_make_no_calls() {
        let h = harness(FakeBackend::happy(Route::Service));

        let err = h.orchestrator.submit("   ").await.unwrap_err();
        assert_eq!(err, SubmitError::InvalidInput(InputProblem::Empty));

        let err = h.orchestrator.submit("hello world").await.unwrap_err();
        assert_eq!(err, SubmitError::InvalidInput(InputProblem::NotChinese));
        assert_ne!(
            SubmitError::InvalidInput(InputProblem::Empty).to_string(),
            err.to_string()
        );

        assert_eq!(h.service.remote_calls(), 0);
        let st = h.orchestrator.state();
        let st = st.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Error);
        assert!(st.error_message.is_some());
    }

    #[tokio::test]
    async fn fresh_text_is_fetched_charged_and_cached() {
        let h = harness(FakeBackend::happy(Route::Service));

        let payload = h.orchestrator.submit("  你好世界 ").await.unwrap();

        assert_eq!(payload.text, "你好世界");
        assert_eq!(payload.pinyin.as_deref(), Some("nǐ hǎo shì jiè"));
        assert_eq!(payload.words, Some(nihao_words()));
        assert_eq!(
            payload.audio_base64.as_deref(),
            Some(BASE64.encode(b"ID3-fake-mp3").as_str())
        );
        assert!(!payload.cached);
        assert_eq!(payload.usage.map(|u| u.total_tokens), Some(100));
        assert_eq!(h.orchestrator.budget().used(), 100);
        assert_eq!(h.service.remote_calls(), 3);

        let cached = h.orchestrator.cache().get("你好世界").expect("cached");
        assert!(cached.has_audio());

        let st = h.orchestrator.state();
        let st = st.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Result);
        assert_eq!(st.current.as_ref().map(|p| p.text.as_str()), Some("你好世界"));
    }

    #[tokio::test]
    async fn repeated_text_reuses_the_displayed_result() {
        let h = harness(FakeBackend::happy(Route::Service));
        h.orchestrator.submit("你好世界").await.unwrap();
        let again = h.orchestrator.submit("你好世界").await.unwrap();

        assert_eq!(again.pinyin.as_deref(), Some("nǐ hǎo shì jiè"));
        assert_eq!(h.service.remote_calls(), 3);
        assert_eq!(h.orchestrator.budget().used(), 100);
    }

    #[tokio::test]
    async fn cache_hit_skips_completions() {
        let store = Arc::new(MemoryStore::new());
        let first = harness_with_store(
            FakeBackend::happy(Route::Service),
            FakeBackend::happy(Route::Direct),
            store.clone(),
        );
        first.orchestrator.submit("你好世界").await.unwrap();

        // A new session over the same storage.
        let second = harness_with_store(
            FakeBackend::happy(Route::Service),
            FakeBackend::happy(Route::Direct),
            store,
        );
        let payload = second.orchestrator.submit("你好世界").await.unwrap();

        assert!(payload.cached);
        assert!(payload.has_audio());
        assert_eq!(second.service.remote_calls(), 0);
        assert_eq!(second.orchestrator.budget().used(), 100);
    }

    #[tokio::test]
    async fn cache_hit_without_audio_backfills_it() {
        let h = harness(FakeBackend::happy(Route::Service));
        let entry = ResultPayload {
            pinyin: Some("nǐ hǎo shì jiè".into()),
            words: Some(nihao_words()),
            ..ResultPayload::new("你好世界")
        };
        assert!(h.orchestrator.cache().put("你好世界", &entry));

        let payload = h.orchestrator.submit("你好世界").await.unwrap();
        assert!(payload.cached);
        assert!(!payload.has_audio());

        h.orchestrator.wait_for_background().await;

        assert_eq!(h.service.completion_calls(), 0);
        assert_eq!(h.service.speech_calls.load(Ordering::SeqCst), 1);
        assert!(h.orchestrator.cache().get("你好世界").unwrap().has_audio());

        let st = h.orchestrator.state();
        let st = st.lock().unwrap();
        assert!(!st.audio_pending);
        assert!(st.current.as_ref().is_some_and(ResultPayload::has_audio));
    }

    #[tokio::test]
    async fn spent_budget_without_key_is_quota_exceeded() {
        let h = harness(FakeBackend::happy(Route::Service));
        h.orchestrator.budget().add(CEILING);

        let err = h.orchestrator.submit("你好").await.unwrap_err();

        assert_eq!(err, SubmitError::QuotaExceeded);
        assert_eq!(h.service.remote_calls(), 0);
        let st = h.orchestrator.state();
        assert_eq!(st.lock().unwrap().pipeline, PipelineState::LimitReached);
    }

    #[tokio::test]
    async fn user_key_goes_direct_and_is_never_charged() {
        let h = harness(FakeBackend::happy(Route::Service));
        h.orchestrator.budget().add(CEILING);
        h.orchestrator.set_credential("sk-user").unwrap();

        let payload = h.orchestrator.submit("你好世界").await.unwrap();

        assert!(payload.pinyin.is_some());
        assert_eq!(h.service.remote_calls(), 0);
        assert_eq!(h.connector.backend.remote_calls(), 3);
        assert_eq!(*h.connector.keys.lock().unwrap(), vec!["sk-user".to_string()]);
        assert_eq!(h.orchestrator.budget().used(), CEILING);
    }

    #[tokio::test]
    async fn rejected_user_key_is_invalid_credential() {
        let direct = FakeBackend::happy(Route::Direct)
            .with_pinyin(Err(rejected(401)))
            .with_words(Err(rejected(401)));
        let h = harness_with_store(
            FakeBackend::happy(Route::Service),
            direct,
            Arc::new(MemoryStore::new()),
        );
        h.orchestrator.set_credential("sk-bad").unwrap();

        let err = h.orchestrator.submit("你好").await.unwrap_err();

        assert_eq!(err, SubmitError::InvalidCredential);
        assert_eq!(h.orchestrator.budget().used(), 0);
        assert!(h.orchestrator.cache().get("你好").is_none());
    }

    #[tokio::test]
    async fn rejection_on_the_service_route_is_a_remote_error() {
        let service = FakeBackend::happy(Route::Service)
            .with_pinyin(Err(rejected(403)))
            .with_words(Err(rejected(403)))
            .with_speech(Err(rejected(403)));
        let h = harness(service);

        let err = h.orchestrator.submit("你好").await.unwrap_err();
        assert!(matches!(err, SubmitError::Remote(_)));
    }

    #[tokio::test]
    async fn non_json_words_leaves_words_empty() {
        let service = FakeBackend::happy(Route::Service).with_words(Err(RemoteError::Malformed(
            "expected a JSON array".into(),
        )));
        let h = harness(service);

        let payload = h.orchestrator.submit("你好世界").await.unwrap();

        assert!(payload.words.is_none());
        assert!(payload.pinyin.is_some());
        assert!(payload.has_audio());
        assert!(h.orchestrator.cache().get("你好世界").is_none());
        // Only the pinyin completion reported usage.
        assert_eq!(h.orchestrator.budget().used(), 30);
    }

    #[tokio::test]
    async fn audio_failure_still_renders_and_caches() {
        let service = FakeBackend::happy(Route::Service).with_speech(Err(RemoteError::NoAudioUrl));
        let h = harness(service);

        let payload = h.orchestrator.submit("你好世界").await.unwrap();

        assert!(!payload.has_audio());
        assert!(payload.words.is_some());
        assert!(h.orchestrator.cache().get("你好世界").is_some());
    }

    #[tokio::test]
    async fn echoed_pinyin_and_partial_words_are_dropped() {
        let service = FakeBackend::happy(Route::Service)
            .with_pinyin(Ok(Completion {
                content: "你好".into(),
                usage: None,
            }))
            .with_words(Ok(WordsCompletion {
                words: vec![WordEntry::new("你好", "", "hello")],
                usage: None,
            }));
        let h = harness(service);

        let payload = h.orchestrator.submit("你好").await.unwrap();

        assert!(payload.pinyin.is_none());
        assert!(payload.words.is_none());
        assert!(payload.has_audio());
        assert_eq!(h.orchestrator.budget().used(), 0);
    }

    #[tokio::test]
    async fn total_failure_is_one_composed_message() {
        let service = FakeBackend::happy(Route::Service)
            .with_pinyin(Err(RemoteError::NotConfigured("completion API key")))
            .with_words(Err(RemoteError::NotConfigured("completion API key")))
            .with_speech(Err(RemoteError::NoAudioUrl));
        let h = harness(service);

        let err = h.orchestrator.submit("你好").await.unwrap_err();

        let SubmitError::Remote(message) = &err else {
            panic!("expected Remote, got {err:?}");
        };
        assert!(message.contains("not configured"));
        assert!(message.contains("no audio URL"));
        let st = h.orchestrator.state();
        let st = st.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Error);
        assert_eq!(st.error_message.as_deref(), Some(err.to_string().as_str()));
    }

    #[derive(PartialEq)]
    enum Gate {
        Pinyin,
        Speech,
    }

    /// Holds one branch for one text until released.
    struct GatedBackend {
        inner: FakeBackend,
        gate: Gate,
        slow_text: &'static str,
        entered: Notify,
        release: Notify,
    }

    impl GatedBackend {
        fn new(gate: Gate, slow_text: &'static str) -> Self {
            Self {
                inner: FakeBackend::happy(Route::Service),
                gate,
                slow_text,
                entered: Notify::new(),
                release: Notify::new(),
            }
        }

        async fn hold(&self, gate: Gate, text: &str) {
            if self.gate == gate && text == self.slow_text {
                self.entered.notify_one();
                self.release.notified().await;
            }
        }
    }

    #[async_trait]
    impl Backend for GatedBackend {
        fn route(&self) -> Route {
            self.inner.route()
        }

        async fn pinyin(&self, text: &str) -> Result<Completion, RemoteError> {
            self.hold(Gate::Pinyin, text).await;
            self.inner.pinyin(text).await
        }

        async fn words(&self, text: &str) -> Result<WordsCompletion, RemoteError> {
            self.inner.words(text).await
        }

        async fn speech(&self, text: &str) -> Result<Vec<u8>, RemoteError> {
            self.hold(Gate::Speech, text).await;
            self.inner.speech(text).await
        }
    }

    fn gated_orchestrator(backend: &Arc<GatedBackend>) -> Arc<Orchestrator> {
        Arc::new(Orchestrator::new(
            new_shared_state(),
            Arc::new(MemoryStore::new()),
            CEILING,
            backend.clone(),
            Arc::new(FakeConnector::new(FakeBackend::happy(Route::Direct))),
        ))
    }

    #[tokio::test]
    async fn superseded_submission_is_not_displayed() {
        let backend = Arc::new(GatedBackend::new(Gate::Pinyin, "慢"));
        let orchestrator = gated_orchestrator(&backend);

        let slow = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.submit("慢").await })
        };
        backend.entered.notified().await;

        orchestrator.submit("你好世界").await.unwrap();
        backend.release.notify_one();
        let stale = slow.await.unwrap().unwrap();
        assert_eq!(stale.text, "慢");

        let st = orchestrator.state();
        let st = st.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Result);
        assert_eq!(st.current.as_ref().map(|p| p.text.as_str()), Some("你好世界"));
    }

    #[tokio::test]
    async fn resubmitting_during_backfill_keeps_the_audio() {
        let backend = Arc::new(GatedBackend::new(Gate::Speech, "你好世界"));
        let orchestrator = gated_orchestrator(&backend);
        let entry = ResultPayload {
            pinyin: Some("nǐ hǎo shì jiè".into()),
            words: Some(nihao_words()),
            ..ResultPayload::new("你好世界")
        };
        assert!(orchestrator.cache().put("你好世界", &entry));

        let first = orchestrator.submit("你好世界").await.unwrap();
        assert!(!first.has_audio());
        backend.entered.notified().await;

        let again = orchestrator.submit("你好世界").await.unwrap();
        assert!(!again.has_audio());
        assert!(orchestrator.state().lock().unwrap().audio_pending);

        backend.release.notify_one();
        orchestrator.wait_for_background().await;

        {
            let st = orchestrator.state();
            let st = st.lock().unwrap();
            assert!(!st.audio_pending);
            assert!(st.current.as_ref().is_some_and(ResultPayload::has_audio));
        }
        assert!(orchestrator.cache().get("你好世界").unwrap().has_audio());

        let third = orchestrator.submit("你好世界").await.unwrap();
        assert!(third.has_audio());
        assert_eq!(backend.inner.speech_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unusable_breakdown_is_still_charged() {
        let service = FakeBackend::happy(Route::Service).with_words(Ok(WordsCompletion {
            words: Vec::new(),
            usage: Some(crate::testing::usage(4000)),
        }));
        let h = harness(service);

        let payload = h.orchestrator.submit("你好世界").await.unwrap();

        assert!(payload.words.is_none());
        assert!(payload.pinyin.is_some());
        assert_eq!(h.orchestrator.budget().used(), 4030);
        assert!(h.orchestrator.budget().over_limit());
    }

    #[tokio::test]
    async fn clear_returns_to_idle() {
        let h = harness(FakeBackend::happy(Route::Service));
        h.orchestrator.submit("你好世界").await.unwrap();
        h.orchestrator.clear();

        let st = h.orchestrator.state();
        let st = st.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Idle);
        assert!(st.current.is_none());
    }
}

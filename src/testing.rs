//! Test helpers: local stub HTTP servers and in-process fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use crate::backend::{Backend, DirectConnector, Route, WordsCompletion};
use crate::error::{Endpoint, RemoteError};
use crate::llm::{Completion, TokenUsage, WordEntry};

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    format!("http://{addr}")
}

pub fn usage(total: u64) -> TokenUsage {
    TokenUsage {
        prompt_tokens: total / 2,
        completion_tokens: total - total / 2,
        total_tokens: total,
    }
}

pub fn nihao_words() -> Vec<WordEntry> {
    vec![
        WordEntry::new("你好", "nǐ hǎo", "hello"),
        WordEntry::new("世界", "shì jiè", "world"),
    ]
}

/// Scripted backend that counts how often each branch is called.
pub struct FakeBackend {
    pub route: Route,
    pub pinyin: Mutex<Result<Completion, RemoteError>>,
    pub words: Mutex<Result<WordsCompletion, RemoteError>>,
    pub speech: Mutex<Result<Vec<u8>, RemoteError>>,
    pub pinyin_calls: AtomicUsize,
    pub words_calls: AtomicUsize,
    pub speech_calls: AtomicUsize,
}

impl FakeBackend {
    /// A backend that answers "你好世界" correctly.
    pub fn happy(route: Route) -> Self {
        Self {
            route,
            pinyin: Mutex::new(Ok(Completion {
                content: "nǐ hǎo shì jiè".into(),
                usage: Some(usage(30)),
            })),
            words: Mutex::new(Ok(WordsCompletion {
                words: nihao_words(),
                usage: Some(usage(70)),
            })),
            speech: Mutex::new(Ok(b"ID3-fake-mp3".to_vec())),
            pinyin_calls: AtomicUsize::new(0),
            words_calls: AtomicUsize::new(0),
            speech_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_speech(self, result: Result<Vec<u8>, RemoteError>) -> Self {
        *self.speech.lock().unwrap() = result;
        self
    }

    pub fn with_words(self, result: Result<WordsCompletion, RemoteError>) -> Self {
        *self.words.lock().unwrap() = result;
        self
    }

    pub fn with_pinyin(self, result: Result<Completion, RemoteError>) -> Self {
        *self.pinyin.lock().unwrap() = result;
        self
    }

    pub fn remote_calls(&self) -> usize {
        self.pinyin_calls.load(Ordering::SeqCst)
            + self.words_calls.load(Ordering::SeqCst)
            + self.speech_calls.load(Ordering::SeqCst)
    }

    pub fn completion_calls(&self) -> usize {
        self.pinyin_calls.load(Ordering::SeqCst) + self.words_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn route(&self) -> Route {
        self.route
    }

    async fn pinyin(&self, _text: &str) -> Result<Completion, RemoteError> {
        self.pinyin_calls.fetch_add(1, Ordering::SeqCst);
        self.pinyin.lock().unwrap().clone()
    }

    async fn words(&self, _text: &str) -> Result<WordsCompletion, RemoteError> {
        self.words_calls.fetch_add(1, Ordering::SeqCst);
        self.words.lock().unwrap().clone()
    }

    async fn speech(&self, _text: &str) -> Result<Vec<u8>, RemoteError> {
        self.speech_calls.fetch_add(1, Ordering::SeqCst);
        self.speech.lock().unwrap().clone()
    }
}

/// Connector that hands out one shared fake and records the keys it saw.
pub struct FakeConnector {
    pub backend: Arc<FakeBackend>,
    pub keys: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub fn new(backend: FakeBackend) -> Self {
        Self {
            backend: Arc::new(backend),
            keys: Mutex::new(Vec::new()),
        }
    }
}

impl DirectConnector for FakeConnector {
    fn connect(&self, credential: &str) -> Arc<dyn Backend> {
        self.keys.lock().unwrap().push(credential.to_string());
        self.backend.clone()
    }
}

pub fn rejected(status: u16) -> RemoteError {
    RemoteError::Status {
        endpoint: Endpoint::Completion,
        status,
        message: "invalid api key".into(),
    }
}

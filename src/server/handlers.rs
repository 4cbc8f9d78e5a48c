//! Request handlers for the proxy routes.

use std::path::{Component, Path as FsPath};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::protocol::{ApiRequest, ApiResponse, Mode};
use super::ServerState;
use crate::llm::{TokenUsage, WordEntry};
use crate::share::SharePayload;

const NOT_SET: &str = "GMI_API_KEY not set.";

/// `POST /api`. Bodies that do not parse are treated as empty requests.
pub async fn api(State(state): State<ServerState>, body: Bytes) -> Response {
    let request: ApiRequest = serde_json::from_slice(&body).unwrap_or_default();
    log::debug!("server: {:?} request", request.mode);

    let text = request.text.as_deref().unwrap_or_default().trim().to_string();
    if text.is_empty() && request.mode != Mode::ShareLoad {
        return Json(ApiResponse::failure("No text provided.")).into_response();
    }

    let mut outcome = Outcome::new(&text);
    match request.mode {
        Mode::ShareLoad => {
            return share_load(&state, request.id.as_deref().unwrap_or_default()).await;
        }
        Mode::ShareSave => {
            let share = SharePayload {
                text,
                pinyin: request.pinyin,
                words: request.words,
            };
            return share_save(&state, &share).await;
        }
        Mode::Pinyin => outcome.merge_pinyin(pinyin(&state, &text).await),
        Mode::Breakdown => outcome.merge_words(words(&state, &text).await),
        Mode::Tts => outcome.merge_speech(speech(&state, &text).await),
        Mode::Words => {
            let (pinyin, words) = tokio::join!(pinyin(&state, &text), words(&state, &text));
            outcome.merge_pinyin(pinyin);
            outcome.merge_words(words);
        }
        Mode::Full => {
            let (pinyin, speech) = tokio::join!(pinyin(&state, &text), speech(&state, &text));
            outcome.merge_pinyin(pinyin);
            outcome.merge_speech(speech);
        }
    }
    Json(outcome.finish()).into_response()
}

/// Any other method on `/api`.
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ApiResponse::failure("Method not allowed")),
    )
        .into_response()
}

pub async fn index(State(state): State<ServerState>) -> Response {
    serve_file(&state.static_dir.join("index.html")).await
}

/// Share links land on the app shell; the page loads the share itself.
pub async fn share_page(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return not_found();
    }
    serve_file(&state.static_dir.join("index.html")).await
}

pub async fn static_file(State(state): State<ServerState>, Path(path): Path<String>) -> Response {
    let relative = FsPath::new(&path);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return not_found();
    }
    serve_file(&state.static_dir.join(relative)).await
}

// ---------------------------------------------------------------------------
// Remote modes
// ---------------------------------------------------------------------------

type Branch<T> = Result<(T, Option<TokenUsage>), String>;

async fn pinyin(state: &ServerState, text: &str) -> Branch<String> {
    let backend = state.backend.as_ref().ok_or_else(|| format!("Pinyin: {NOT_SET}"))?;
    backend
        .pinyin(text)
        .await
        .map(|c| (c.content, c.usage))
        .map_err(|e| format!("Pinyin: {e}"))
}

async fn words(state: &ServerState, text: &str) -> Branch<Vec<WordEntry>> {
    let backend = state.backend.as_ref().ok_or_else(|| format!("Words: {NOT_SET}"))?;
    backend
        .words(text)
        .await
        .map(|w| (w.words, w.usage))
        .map_err(|e| format!("Words: {e}"))
}

async fn speech(state: &ServerState, text: &str) -> Branch<String> {
    let backend = state.backend.as_ref().ok_or_else(|| format!("TTS: {NOT_SET}"))?;
    backend
        .speech(text)
        .await
        .map(|bytes| (BASE64.encode(bytes), None))
        .map_err(|e| format!("TTS: {e}"))
}

/// Accumulates branch results into one response.
struct Outcome {
    response: ApiResponse,
    errors: Vec<String>,
}

impl Outcome {
    fn new(text: &str) -> Self {
        Self {
            response: ApiResponse {
                text: Some(text.to_string()),
                ..ApiResponse::default()
            },
            errors: Vec::new(),
        }
    }

    fn merge_pinyin(&mut self, result: Branch<String>) {
        match result {
            Ok((pinyin, usage)) => {
                self.response.pinyin = Some(pinyin);
                self.add_usage(usage);
            }
            Err(e) => self.errors.push(e),
        }
    }

    fn merge_words(&mut self, result: Branch<Vec<WordEntry>>) {
        match result {
            Ok((words, usage)) => {
                self.response.words = Some(words);
                self.add_usage(usage);
            }
            Err(e) => self.errors.push(e),
        }
    }

    fn merge_speech(&mut self, result: Branch<String>) {
        match result {
            Ok((audio, _)) => self.response.audio_base64 = Some(audio),
            Err(e) => self.errors.push(e),
        }
    }

    fn add_usage(&mut self, usage: Option<TokenUsage>) {
        self.response.usage = TokenUsage::combine(self.response.usage, usage);
    }

    fn finish(mut self) -> ApiResponse {
        if !self.errors.is_empty() {
            log::warn!("server: {}", self.errors.join(" "));
            self.response.error = Some(self.errors.join(" "));
        }
        self.response.ok = self.errors.is_empty();
        self.response
    }
}

// ---------------------------------------------------------------------------
// Shares
// ---------------------------------------------------------------------------

async fn share_save(state: &ServerState, share: &SharePayload) -> Response {
    match state.shares.save(share).await {
        Ok(id) => Json(ApiResponse {
            ok: true,
            id: Some(id),
            ..ApiResponse::default()
        })
        .into_response(),
        Err(e) => server_error(e),
    }
}

async fn share_load(state: &ServerState, id: &str) -> Response {
    match state.shares.load(id).await {
        Ok(Some(share)) => Json(ApiResponse {
            ok: true,
            text: Some(share.text),
            pinyin: share.pinyin,
            words: share.words,
            ..ApiResponse::default()
        })
        .into_response(),
        Ok(None) => Json(ApiResponse::failure("Share not found.")).into_response(),
        Err(e) => server_error(e),
    }
}

fn server_error(e: impl std::fmt::Display) -> Response {
    log::error!("server: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::failure(format!("Server error: {e}"))),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Static files
// ---------------------------------------------------------------------------

fn content_type(path: &FsPath) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("mp3") => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

async fn serve_file(path: &FsPath) -> Response {
    match tokio::fs::read(path).await {
        Ok(body) => ([(header::CONTENT_TYPE, content_type(path))], body).into_response(),
        Err(_) => not_found(),
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

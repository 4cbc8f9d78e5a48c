//! Terminal front end: renders results and pipeline state as plain text.
//!
//! # Layout
//!
//! ```text
//! 你好世界
//! nǐ hǎo shì jiè
//!
//! 你好  nǐ hǎo    hello
//! 世界  shì jiè   world
//!
//! audio: ready (cached)
//! ```

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::llm::WordEntry;
use crate::payload::ResultPayload;
use crate::pipeline::{AppState, PipelineState};
use crate::script::is_han;

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Columns a string occupies in a terminal; Han characters are double width.
fn display_width(s: &str) -> usize {
    s.chars().map(|c| if is_han(c) { 2 } else { 1 }).sum()
}

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(s));
    format!("{s}{}", " ".repeat(fill))
}

fn render_words(out: &mut String, words: &[WordEntry]) {
    let word_col = words.iter().map(|w| display_width(&w.word)).max().unwrap_or(0);
    let pinyin_col = words.iter().map(|w| display_width(&w.pinyin)).max().unwrap_or(0);
    for w in words {
        let line = format!(
            "{}  {}  {}",
            pad(&w.word, word_col),
            pad(&w.pinyin, pinyin_col),
            w.definition
        );
        let _ = writeln!(out, "{}", line.trim_end());
    }
}

/// Render a payload as text: characters, pinyin, word table and audio status.
pub fn render(payload: &ResultPayload) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", payload.text);
    match &payload.pinyin {
        Some(pinyin) => {
            let _ = writeln!(out, "{pinyin}");
        }
        None => out.push_str("(pinyin unavailable)\n"),
    }

    if let Some(words) = payload.words.as_deref().filter(|w| !w.is_empty()) {
        out.push('\n');
        render_words(&mut out, words);
    }

    out.push('\n');
    let audio = if payload.has_audio() { "ready" } else { "unavailable" };
    let _ = write!(out, "audio: {audio}");
    if payload.cached {
        out.push_str(" (cached)");
    }
    out.push('\n');
    out
}

/// One-line summary of the pipeline state.
pub fn status_line(state: &AppState) -> String {
    match state.pipeline {
        PipelineState::Error | PipelineState::LimitReached => format!(
            "{}: {}",
            state.pipeline.label(),
            state.error_message.as_deref().unwrap_or("unknown error")
        ),
        PipelineState::Result if state.audio_pending => {
            format!("{} (fetching audio)", state.pipeline.label())
        }
        _ => state.pipeline.label().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Write the payload's audio to `path`. Returns `false` when there is none.
pub fn write_audio(payload: &ResultPayload, path: &Path) -> Result<bool> {
    let Some(encoded) = payload.audio_base64.as_deref() else {
        return Ok(false);
    };
    let bytes = BASE64
        .decode(encoded)
        .context("stored audio is not valid base64")?;
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

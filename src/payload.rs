//! The unit that is rendered, cached and shared.
//!
//! Two predicates decide what a payload is good for, and they are
//! deliberately different:
//!
//! * [`ResultPayload::is_renderable`] — something can be shown (any field).
//! * [`ResultPayload::is_cacheable`] — the result is complete and cannot be
//!   mistaken for a failed call.

use serde::{Deserialize, Serialize};

use crate::llm::{is_complete_list, TokenUsage, WordEntry};
use crate::script::contains_romanization;

/// Pinyin, word breakdown and audio for one input text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPayload {
    /// Trimmed input text. May be absent in storage, where the cache key
    /// already implies it.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub pinyin: Option<String>,
    #[serde(default)]
    pub words: Option<Vec<WordEntry>>,
    /// Encoded audio (MP3), base64 so it can live in JSON storage.
    #[serde(default)]
    pub audio_base64: Option<String>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
    /// Display-only: served from the cache. Never persisted.
    #[serde(skip)]
    pub cached: bool,
}

impl ResultPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// At least one of pinyin, words or audio is present.
    pub fn is_renderable(&self) -> bool {
        self.pinyin.is_some() || self.words.is_some() || self.audio_base64.is_some()
    }

    /// Valid pinyin for `text` and a complete, non-empty word list.
    pub fn is_cacheable(&self) -> bool {
        let pinyin_ok = self
            .pinyin
            .as_deref()
            .is_some_and(|p| is_valid_pinyin(&self.text, p));
        let words_ok = self.words.as_deref().is_some_and(is_complete_list);
        pinyin_ok && words_ok
    }

    pub fn has_audio(&self) -> bool {
        self.audio_base64.is_some()
    }
}

/// Pinyin is usable when it is non-empty, is not an echo of the input and
/// contains romanization characters.
pub fn is_valid_pinyin(input: &str, pinyin: &str) -> bool {
    let pinyin = pinyin.trim();
    !pinyin.is_empty() && pinyin != input.trim() && contains_romanization(pinyin)
}

//! Word-breakdown entries and parsing of the model's JSON array.
//!
//! The model is asked for bare JSON but may still wrap it in a fenced code
//! block, return prose, or drop fields. Anything that does not parse is an
//! ordinary [`RemoteError::Malformed`]; entries with missing fields parse
//! (as empty strings) and are rejected later by [`is_complete_list`].

use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

/// One segmented word with its pronunciation and gloss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub pinyin: String,
    #[serde(default)]
    pub definition: String,
}

impl WordEntry {
    pub fn new(word: &str, pinyin: &str, definition: &str) -> Self {
        Self {
            word: word.into(),
            pinyin: pinyin.into(),
            definition: definition.into(),
        }
    }

    /// All three fields carry non-blank text.
    pub fn is_complete(&self) -> bool {
        [&self.word, &self.pinyin, &self.definition]
            .iter()
            .all(|f| !f.trim().is_empty())
    }
}

/// `true` if the list is non-empty and every entry is complete.
///
/// A list with a single incomplete entry is rejected whole.
pub fn is_complete_list(words: &[WordEntry]) -> bool {
    !words.is_empty() && words.iter().all(WordEntry::is_complete)
}

/// Remove one surrounding triple-backtick fence (with optional language tag).
///
/// ```
/// use read_for_me::llm::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
/// assert_eq!(strip_code_fence("[1]"), "[1]");
/// ```
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.split_once('\n') {
        Some((tag, body)) if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) => body,
        _ => rest,
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a completion body into word entries.
pub fn parse_word_list(content: &str) -> Result<Vec<WordEntry>, RemoteError> {
    serde_json::from_str(strip_code_fence(content))
        .map_err(|e| RemoteError::Malformed(format!("word breakdown is not a JSON array: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARRAY: &str =
        r#"[{"word":"你好","pinyin":"nǐ hǎo","definition":"hello"},{"word":"世界","pinyin":"shì jiè","definition":"world"}]"#;

    #[test]
    fn parses_bare_array() {
        let words = parse_word_list(ARRAY).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], WordEntry::new("你好", "nǐ hǎo", "hello"));
        assert!(is_complete_list(&words));
    }

    #[test]
    fn parses_fenced_array_with_and_without_tag() {
        let tagged = format!("```json\n{ARRAY}\n```");
        let untagged = format!("```\n{ARRAY}\n```");
        let inline = format!("```{ARRAY}```");
        for content in [tagged, untagged, inline] {
            let words = parse_word_list(&content).unwrap();
            assert_eq!(words.len(), 2, "failed on {content:?}");
        }
    }

    #[test]
    fn prose_is_malformed_not_a_panic() {
        let err = parse_word_list("Sure! Here is the breakdown: 你好 = hello").unwrap_err();
        assert!(matches!(err, RemoteError::Malformed(_)));
        assert!(parse_word_list("").is_err());
        assert!(parse_word_list(r#"{"word":"你好"}"#).is_err());
    }

    #[test]
    fn missing_fields_parse_but_are_incomplete() {
        let words = parse_word_list(r#"[{"word":"你好","pinyin":"nǐ hǎo"}]"#).unwrap();
        assert_eq!(words[0].definition, "");
        assert!(!is_complete_list(&words));
    }

    #[test]
    fn one_bad_entry_rejects_the_whole_list() {
        let words = vec![
            WordEntry::new("你好", "nǐ hǎo", "hello"),
            WordEntry::new("世界", " ", "world"),
        ];
        assert!(!is_complete_list(&words));
        assert!(!is_complete_list(&[]));
    }
}

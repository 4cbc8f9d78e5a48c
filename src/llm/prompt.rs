//! System prompts for the two completion shapes.
//!
//! * **Pinyin** — free text: tone-marked pinyin only.
//! * **Words** — a JSON array of `{word, pinyin, definition}` objects.

use crate::config::CompletionConfig;

const PINYIN_SYSTEM_PROMPT: &str = "\
You are a pinyin converter for Mandarin Chinese. Output only the pinyin with \
tone marks (e.g., nǐ hǎo for 你好). Use spaces between words/syllables. \
No explanations, no other text.";

const WORDS_SYSTEM_PROMPT: &str = "\
You segment Mandarin Chinese text into words for a language learner.
Return ONLY a JSON array, no prose and no code fences. Each element must be an object:
{\"word\": \"<the Chinese word exactly as it appears in the input>\", \
\"pinyin\": \"<tone-marked pinyin>\", \"definition\": \"<short English gloss>\"}

Rules:
1. Cover the input in order; do not skip or merge distant words.
2. Leave punctuation out of the array.
3. Keep non-Chinese tokens (numbers, Latin words) as their own entries with the \
token itself as pinyin.
4. Keep definitions to a few words.";

/// Which completion is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Pinyin,
    Words,
}

impl PromptKind {
    pub fn system_prompt(self) -> &'static str {
        match self {
            PromptKind::Pinyin => PINYIN_SYSTEM_PROMPT,
            PromptKind::Words => WORDS_SYSTEM_PROMPT,
        }
    }

    /// Output cap; the word list gets more room so long inputs are not cut
    /// off mid-array.
    pub fn max_tokens(self, config: &CompletionConfig) -> u32 {
        match self {
            PromptKind::Pinyin => config.pinyin_max_tokens,
            PromptKind::Words => config.words_max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinyin_prompt_asks_for_tone_marks_only() {
        let prompt = PromptKind::Pinyin.system_prompt();
        assert!(prompt.contains("tone marks"));
        assert!(prompt.contains("No explanations"));
    }

    #[test]
    fn words_prompt_names_all_three_fields() {
        let prompt = PromptKind::Words.system_prompt();
        for field in ["\"word\"", "\"pinyin\"", "\"definition\"", "JSON array"] {
            assert!(prompt.contains(field), "missing {field}");
        }
    }

    #[test]
    fn words_get_the_larger_budget() {
        let config = CompletionConfig::default();
        assert_eq!(PromptKind::Pinyin.max_tokens(&config), 2000);
        assert_eq!(PromptKind::Words.max_tokens(&config), 4000);
    }
}

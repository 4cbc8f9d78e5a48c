//! Chat-completion module for pinyin and word breakdown.
//!
//! This module provides:
//! * [`CompletionClient`] — async trait implemented by completion backends.
//! * [`ApiCompletionClient`] — OpenAI-compatible REST client.
//! * [`PromptKind`] — the pinyin and word-breakdown request shapes.
//! * [`WordEntry`] / [`parse_word_list`] — JSON word-array parsing with
//!   code-fence stripping.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use read_for_me::config::AppConfig;
//! use read_for_me::llm::{ApiCompletionClient, CompletionClient, PromptKind};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default().with_env(None);
//!     let client = ApiCompletionClient::from_config(
//!         &config.completion,
//!         config.service.api_key.clone(),
//!     );
//!
//!     let kind = PromptKind::Pinyin;
//!     let completion = client
//!         .complete(kind.system_prompt(), "你好", kind.max_tokens(&config.completion))
//!         .await
//!         .unwrap();
//!     println!("{}", completion.content);
//! }
//! ```

pub mod completion;
pub mod prompt;
pub mod words;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use completion::{ApiCompletionClient, Completion, CompletionClient, TokenUsage};
pub use prompt::PromptKind;
pub use words::{is_complete_list, parse_word_list, strip_code_fence, WordEntry};

//! Read For Me — Chinese text to pinyin, word gloss and speech.
//!
//! The heavy lifting is done by a hosted chat-completion model (pinyin and
//! word breakdown) and a hosted speech endpoint. This crate shapes those
//! requests, validates what comes back, caches good results in client
//! storage, tracks an advisory token budget and serves the proxy that holds
//! the service credential.
//!
//! ```text
//! submit(text)
//!   ├─ validate input (non-empty, contains Han characters)
//!   ├─ last result for the same text?   → reuse
//!   ├─ ResultCache hit?                 → return, backfill audio in background
//!   ├─ no user key and budget spent?    → QuotaExceeded
//!   └─ join!(pinyin, words, speech)     → validate, merge, charge, cache
//! ```

pub mod app;
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod payload;
pub mod pipeline;
pub mod script;
pub mod server;
pub mod share;
pub mod store;
pub mod tts;

#[cfg(test)]
pub(crate) mod testing;

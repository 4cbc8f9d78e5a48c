//! Text-to-speech module.
//!
//! * [`SpeechSynthesizer`] — async trait: text in, audio bytes out.
//! * [`ApiSpeechClient`] — submit/download client for the hosted queue.

pub mod synthesizer;

pub use synthesizer::{ApiSpeechClient, SpeechRequest, SpeechSynthesizer};

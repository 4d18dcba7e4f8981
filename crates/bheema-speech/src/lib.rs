//! Text-to-speech pipeline for the Bheema assistant.
//!
//! Spoken output flows through a FIFO [`SpeechQueue`]: requests are
//! synthesized one at a time by a [`Synthesizer`], played through a
//! [`Playback`] sink, and downgraded to a [`FallbackSpeaker`] when synthesis
//! fails or times out. Every request settles with exactly one `speech-ended`
//! event on the bus, which is what lets the conversation controller reopen
//! the microphone after the assistant finishes talking.

pub mod error;
pub mod language;
pub mod provider;
pub mod queue;

pub use error::SpeechError;
pub use language::language_tag;
pub use provider::{AudioClip, FallbackSpeaker, Playback, Synthesizer};
pub use queue::SpeechQueue;

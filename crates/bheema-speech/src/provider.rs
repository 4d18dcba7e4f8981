//! Pluggable speech backends.
//!
//! The queue is generic over three seams: a [`Synthesizer`] that turns text
//! into audio, a [`Playback`] sink that plays it, and a [`FallbackSpeaker`]
//! used when synthesis fails. Production wires HTTP and process-based
//! implementations; tests wire recorders.

use async_trait::async_trait;

use crate::error::SpeechError;

/// One synthesized utterance, ready for playback.
#[derive(Clone, Debug)]
pub struct AudioClip {
    pub data: Vec<u8>,
    /// MIME type reported by the synthesizer, e.g. `audio/mpeg`.
    pub content_type: String,
}

impl AudioClip {
    pub fn new(data: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
        }
    }
}

/// Turns text into an audio clip.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` in the language identified by `language_tag`
    /// (a regional tag such as `hi-IN`, see [`crate::language_tag`]).
    async fn synthesize(&self, text: &str, language_tag: &str) -> Result<AudioClip, SpeechError>;
}

/// Plays synthesized audio.
#[async_trait]
pub trait Playback: Send + Sync {
    /// Play a clip to completion.
    async fn play(&self, clip: AudioClip) -> Result<(), SpeechError>;

    /// Stop whatever is currently playing. Must be safe to call when idle.
    async fn stop(&self);
}

/// Last-resort speech output when synthesis is unavailable, typically an
/// on-device engine with lower quality but no network dependency.
#[async_trait]
pub trait FallbackSpeaker: Send + Sync {
    async fn speak(&self, text: &str, language_tag: &str) -> Result<(), SpeechError>;
}

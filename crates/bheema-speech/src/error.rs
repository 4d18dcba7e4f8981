use bheema_core::BheemaError;
use thiserror::Error;

/// Errors from the speech pipeline.
///
/// The queue absorbs all of these: a failed request falls back to the
/// on-device speaker and the queue moves on, so none of them reach callers
/// of `enqueue`.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// The synthesis backend returned an error.
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    /// Synthesis did not finish within the configured deadline.
    #[error("Speech synthesis timed out after {0}s")]
    Timeout(u64),

    /// The backend answered with zero audio bytes.
    #[error("Speech synthesis returned empty audio")]
    EmptyAudio,

    /// The playback sink could not play the clip.
    #[error("Audio playback failed: {0}")]
    Playback(String),

    /// The last-resort speaker itself failed.
    #[error("Fallback speech failed: {0}")]
    Fallback(String),
}

impl From<SpeechError> for BheemaError {
    fn from(err: SpeechError) -> Self {
        BheemaError::Speech(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            SpeechError::Timeout(30).to_string(),
            "Speech synthesis timed out after 30s"
        );
        assert_eq!(
            SpeechError::EmptyAudio.to_string(),
            "Speech synthesis returned empty audio"
        );
    }

    #[test]
    fn test_conversion_to_bheema_error() {
        let err: BheemaError = SpeechError::Playback("no device".to_string()).into();
        assert!(matches!(err, BheemaError::Speech(_)));
    }
}

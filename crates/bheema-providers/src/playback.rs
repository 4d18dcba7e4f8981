//! Audio playback via an external player process, and the logging fallback.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use uuid::Uuid;

use bheema_speech::{AudioClip, FallbackSpeaker, Playback, SpeechError};

/// Removes the clip's temp file when playback is over, on every exit path.
struct TempClip(PathBuf);

impl Drop for TempClip {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            tracing::debug!(path = %self.0.display(), error = %e, "Failed to remove temp clip");
        }
    }
}

/// Plays clips by handing a temp file to an external player binary such as
/// `ffplay` or `mpg123`.
pub struct ProcessPlayback {
    player_command: String,
    child: Mutex<Option<Child>>,
}

impl ProcessPlayback {
    pub fn new(player_command: impl Into<String>) -> Self {
        Self {
            player_command: player_command.into(),
            child: Mutex::new(None),
        }
    }

    fn player_args(&self) -> &[&str] {
        match self.player_command.as_str() {
            "ffplay" => &["-nodisp", "-autoexit", "-loglevel", "quiet"],
            "mpg123" => &["-q"],
            _ => &[],
        }
    }
}

#[async_trait]
impl Playback for ProcessPlayback {
    async fn play(&self, clip: AudioClip) -> Result<(), SpeechError> {
        let path = std::env::temp_dir().join(format!("bheema-tts-{}.mp3", Uuid::new_v4()));
        tokio::fs::write(&path, &clip.data)
            .await
            .map_err(|e| SpeechError::Playback(format!("writing clip: {}", e)))?;
        let _guard = TempClip(path.clone());

        let child = Command::new(&self.player_command)
            .args(self.player_args())
            .arg(&path)
            .spawn()
            .map_err(|e| {
                SpeechError::Playback(format!("spawning {}: {}", self.player_command, e))
            })?;
        *self.child.lock().expect("playback mutex poisoned") = Some(child);

        // Poll rather than wait() so stop() can take and kill the child
        // without a lock being held across the await.
        loop {
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
            let mut slot = self.child.lock().expect("playback mutex poisoned");
            match slot.as_mut() {
                // stop() took the child; treat as finished.
                None => return Ok(()),
                Some(child) => match child.try_wait() {
                    Ok(Some(status)) => {
                        *slot = None;
                        if status.success() {
                            return Ok(());
                        }
                        return Err(SpeechError::Playback(format!(
                            "{} exited with {}",
                            self.player_command, status
                        )));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        *slot = None;
                        return Err(SpeechError::Playback(e.to_string()));
                    }
                },
            }
        }
    }

    async fn stop(&self) {
        let child = self.child.lock().expect("playback mutex poisoned").take();
        if let Some(mut child) = child {
            tracing::debug!("Stopping audio player");
            if let Err(e) = child.start_kill() {
                tracing::debug!(error = %e, "Audio player already gone");
            }
        }
    }
}

/// Fallback speaker for machines without a local speech engine: the
/// utterance is logged so the text is never silently lost.
#[derive(Default)]
pub struct StubSpeaker;

#[async_trait]
impl FallbackSpeaker for StubSpeaker {
    async fn speak(&self, text: &str, language_tag: &str) -> Result<(), SpeechError> {
        tracing::info!(language = language_tag, "[speech fallback] {}", text);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_clip_guard_removes_file() {
        let path = std::env::temp_dir().join(format!("bheema-test-{}.mp3", Uuid::new_v4()));
        std::fs::write(&path, b"x").unwrap();
        assert!(path.exists());
        drop(TempClip(path.clone()));
        assert!(!path.exists());
    }

    #[test]
    fn test_player_args_per_binary() {
        assert_eq!(
            ProcessPlayback::new("ffplay").player_args(),
            &["-nodisp", "-autoexit", "-loglevel", "quiet"]
        );
        assert_eq!(ProcessPlayback::new("mpg123").player_args(), &["-q"]);
        assert!(ProcessPlayback::new("aplay").player_args().is_empty());
    }

    #[tokio::test]
    async fn test_missing_player_is_a_playback_error() {
        let playback = ProcessPlayback::new("definitely-not-a-player-binary");
        let err = playback
            .play(AudioClip::new(vec![0u8; 4], "audio/mpeg"))
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::Playback(_)));
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let playback = ProcessPlayback::new("ffplay");
        playback.stop().await;
    }

    #[tokio::test]
    async fn test_stub_speaker_always_succeeds() {
        let speaker = StubSpeaker;
        assert!(speaker.speak("hello", "en-US").await.is_ok());
    }
}

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{BheemaError, Result};

/// Top-level configuration for the Bheema assistant.
///
/// Loaded from `~/.bheema/config.toml` by default. Each section corresponds
/// to one subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BheemaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub providers: ProviderConfig,
}

impl BheemaConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BheemaConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file does not
    /// exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| BheemaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default conversation language code (en, hi, te, ta, kn, mr).
    pub language: String,
    /// Opaque user identifier sent on the session handshake.
    pub user_id: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            user_id: "farmer".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Speech synthesis and playback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Upper bound on a single remote synthesis call, in seconds.
    pub synthesis_timeout_secs: u64,
    /// External command used to play synthesized audio files.
    pub player_command: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            synthesis_timeout_secs: 30,
            player_command: "ffplay".to_string(),
        }
    }
}

/// Conversation session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Attempts made on the session handshake before giving up.
    pub handshake_attempts: u32,
    /// Delay between handshake attempts, in milliseconds.
    pub handshake_interval_ms: u64,
    /// Upper bound on a planner or single-turn task call, in seconds.
    pub task_timeout_secs: u64,
    /// How long the error state persists before auto-recovering to idle.
    pub error_recovery_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake_attempts: 3,
            handshake_interval_ms: 1000,
            task_timeout_secs: 30,
            error_recovery_secs: 3,
        }
    }
}

/// Remote provider endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the agent/TTS backend.
    pub api_base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:7860".to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BheemaConfig::default();
        assert_eq!(config.general.language, "en");
        assert_eq!(config.speech.synthesis_timeout_secs, 30);
        assert_eq!(config.session.handshake_attempts, 3);
        assert_eq!(config.session.task_timeout_secs, 30);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = BheemaConfig::default();
        config.general.language = "kn".to_string();
        config.session.handshake_attempts = 5;
        config.save(&path).unwrap();

        let loaded = BheemaConfig::load(&path).unwrap();
        assert_eq!(loaded.general.language, "kn");
        assert_eq!(loaded.session.handshake_attempts, 5);
        assert_eq!(loaded.speech.synthesis_timeout_secs, 30);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = BheemaConfig::load(Path::new("/nonexistent/bheema.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let config = BheemaConfig::load_or_default(Path::new("/nonexistent/bheema.toml"));
        assert_eq!(config.general.language, "en");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\nlanguage = \"te\"\n").unwrap();

        let loaded = BheemaConfig::load(&path).unwrap();
        assert_eq!(loaded.general.language, "te");
        // Untouched sections keep their defaults.
        assert_eq!(loaded.speech.player_command, "ffplay");
        assert_eq!(loaded.session.error_recovery_secs, 3);
    }

    #[test]
    fn test_malformed_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not toml at all [").unwrap();
        assert!(BheemaConfig::load(&path).is_err());
    }
}

use thiserror::Error;

/// Top-level error type for the Bheema assistant.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for BheemaError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BheemaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event bus error: {0}")]
    Bus(String),

    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for BheemaError {
    fn from(err: toml::de::Error) -> Self {
        BheemaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BheemaError {
    fn from(err: toml::ser::Error) -> Self {
        BheemaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BheemaError {
    fn from(err: serde_json::Error) -> Self {
        BheemaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Bheema operations.
pub type Result<T> = std::result::Result<T, BheemaError>;

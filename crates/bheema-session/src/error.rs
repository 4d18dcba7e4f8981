use bheema_core::BheemaError;
use thiserror::Error;

/// Errors from session setup and remote planner calls.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backend answered but is still warming up its agent.
    #[error("Planner session is not ready yet")]
    NotReady,

    /// The backend could not be reached or returned a transport error.
    #[error("Planner request failed: {0}")]
    Transport(String),

    /// A planner call exceeded the configured deadline.
    #[error("Planner request timed out after {0}s")]
    Timeout(u64),

    /// The backend answered with a body the client could not use.
    #[error("Unexpected planner response: {0}")]
    Protocol(String),
}

impl From<SessionError> for BheemaError {
    fn from(err: SessionError) -> Self {
        BheemaError::Session(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            SessionError::NotReady.to_string(),
            "Planner session is not ready yet"
        );
        assert_eq!(
            SessionError::Timeout(30).to_string(),
            "Planner request timed out after 30s"
        );
    }

    #[test]
    fn test_conversion_to_bheema_error() {
        let err: BheemaError = SessionError::Transport("connection refused".to_string()).into();
        assert!(matches!(err, BheemaError::Session(_)));
    }
}

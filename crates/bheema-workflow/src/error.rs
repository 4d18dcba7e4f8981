use bheema_core::BheemaError;
use thiserror::Error;

/// Errors raised while executing workflow steps.
///
/// These never escape the interpreter boundary as errors: the interpreter
/// catches them, enters the paused(errored) state, and converts them into a
/// spoken and displayed message.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A referenced UI target could not be resolved at execution time.
    #[error("Automation target not found: {0}")]
    TargetNotFound(String),

    /// A step was structurally unusable (missing required field, etc.).
    #[error("Invalid step: {0}")]
    InvalidStep(String),
}

impl From<WorkflowError> for BheemaError {
    fn from(err: WorkflowError) -> Self {
        BheemaError::Workflow(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WorkflowError::TargetNotFound("submit-button".to_string());
        assert_eq!(
            err.to_string(),
            "Automation target not found: submit-button"
        );
    }

    #[test]
    fn test_conversion_to_bheema_error() {
        let err: BheemaError = WorkflowError::InvalidStep("no prompt".to_string()).into();
        assert!(matches!(err, BheemaError::Workflow(_)));
        assert!(err.to_string().contains("no prompt"));
    }
}

//! Remote AI planner contract.
//!
//! The planner is the AI backend that holds an agent session, turns a user
//! request into a [`WorkflowDefinition`], and answers single-turn queries.
//! Production talks HTTP; tests substitute a scripted mock.

use async_trait::async_trait;
use serde::Deserialize;

use bheema_workflow::WorkflowDefinition;

use crate::error::SessionError;

/// A photo or document attached to a submission, forwarded to the planner.
///
/// Disease analysis is the main producer: the camera hands the controller a
/// leaf snapshot together with the spoken request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Answer to a single-turn task that needs no workflow.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TaskReply {
    pub message: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl TaskReply {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestions: Vec::new(),
        }
    }
}

/// The AI planning backend.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Open an agent session for `user_id`. Returns the session id.
    ///
    /// Returns [`SessionError::NotReady`] while the backend agent is still
    /// warming up; callers are expected to retry.
    async fn start_session(
        &self,
        user_id: &str,
        initial_task: &str,
        language: &str,
    ) -> Result<String, SessionError>;

    /// Ask the planner to compile `message` into a workflow.
    ///
    /// `Ok(None)` means the planner decided the request needs no automation
    /// and the caller should fall back to a single-turn task. An attached
    /// photo travels with the request so the planner can see what the user
    /// is asking about.
    async fn generate_workflow(
        &self,
        session_id: &str,
        message: &str,
        language: &str,
        file: Option<&Attachment>,
    ) -> Result<Option<WorkflowDefinition>, SessionError>;

    /// Run a single-turn task inside the session and return its reply.
    async fn execute_task(
        &self,
        session_id: &str,
        task_type: &str,
        user_input: &str,
        language: &str,
        file: Option<&Attachment>,
    ) -> Result<TaskReply, SessionError>;
}

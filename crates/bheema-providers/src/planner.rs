//! HTTP planner against the agent backend.
//!
//! Endpoints:
//! - `POST /api/agent/start-session` (form) -> `{"session_id": ...}`
//! - `POST /api/agent/generate-workflow` (json) -> `{"workflow": [steps]}`
//! - `POST /api/agent/execute-task` (form) -> `{"actions": [{"message": ...}]}`

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use bheema_session::{Attachment, Planner, SessionError, TaskReply};
use bheema_workflow::{WorkflowDefinition, WorkflowStep};

pub struct HttpPlanner {
    client: Client,
    base_url: String,
}

impl HttpPlanner {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, SessionError> {
        // 503 means the backend agent is still warming up.
        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Err(SessionError::NotReady);
        }
        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Transport(format!(
                "backend returned {}",
                status
            )));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))
    }
}

#[async_trait]
impl Planner for HttpPlanner {
    async fn start_session(
        &self,
        user_id: &str,
        initial_task: &str,
        language: &str,
    ) -> Result<String, SessionError> {
        let form = Form::new()
            .text("user_id", user_id.to_string())
            .text("initial_task", initial_task.to_string())
            .text("language", language.to_string());

        let response = self
            .client
            .post(self.url("/api/agent/start-session"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let body = Self::read_json(response).await?;
        body.get("session_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SessionError::Protocol("session response without session_id".to_string()))
    }

    async fn generate_workflow(
        &self,
        _session_id: &str,
        message: &str,
        language: &str,
        file: Option<&Attachment>,
    ) -> Result<Option<WorkflowDefinition>, SessionError> {
        // The workflow endpoint takes JSON, so an attached photo goes
        // inline as base64 rather than as a multipart field.
        let mut payload = json!({
            "user_prompt": message,
            "language": language,
        });
        if let Some(file) = file {
            payload["file_name"] = json!(file.file_name);
            payload["file_data"] = json!(BASE64.encode(&file.bytes));
        }

        let response = self
            .client
            .post(self.url("/api/agent/generate-workflow"))
            .json(&payload)
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let body = Self::read_json(response).await?;
        Ok(parse_workflow(&body, message, language))
    }

    async fn execute_task(
        &self,
        session_id: &str,
        task_type: &str,
        user_input: &str,
        language: &str,
        file: Option<&Attachment>,
    ) -> Result<TaskReply, SessionError> {
        let mut form = Form::new()
            .text("session_id", session_id.to_string())
            .text("task_type", task_type.to_string())
            .text("user_input", user_input.to_string())
            .text("language", language.to_string());
        if let Some(file) = file {
            let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            form = form.part("file", part);
        }

        let response = self
            .client
            .post(self.url("/api/agent/execute-task"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let body = Self::read_json(response).await?;
        parse_task_reply(&body)
    }
}

/// Build a [`WorkflowDefinition`] from a `{"workflow": [steps]}` body.
///
/// An absent or empty step list means the planner chose not to automate,
/// as does a step list that fails to deserialize.
fn parse_workflow(body: &Value, message: &str, language: &str) -> Option<WorkflowDefinition> {
    let steps_json = body.get("workflow")?.as_array()?;
    if steps_json.is_empty() {
        return None;
    }
    let steps: Vec<WorkflowStep> = match serde_json::from_value(Value::Array(steps_json.clone())) {
        Ok(steps) => steps,
        Err(e) => {
            tracing::warn!(error = %e, "Planner produced unusable workflow steps");
            return None;
        }
    };
    Some(WorkflowDefinition {
        intent: "dynamic_workflow".to_string(),
        language: language.to_string(),
        translated_input: message.to_string(),
        steps,
    })
}

/// Extract the user-facing reply from an execute-task body.
///
/// Task handlers answer with an `actions` array whose first entry carries
/// the message and optional suggestions; some also put a top-level message.
fn parse_task_reply(body: &Value) -> Result<TaskReply, SessionError> {
    let first_action = body
        .get("actions")
        .and_then(Value::as_array)
        .and_then(|a| a.first());

    let message = first_action
        .and_then(|a| a.get("message"))
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .ok_or_else(|| SessionError::Protocol("task response without message".to_string()))?;

    let suggestions = first_action
        .and_then(|a| a.get("suggestions"))
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(TaskReply {
        message: message.to_string(),
        suggestions,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workflow_with_steps() {
        let body = json!({
            "workflow": [
                {"action": "navigate", "target": "/market-trends"},
                {"action": "check_status"}
            ]
        });
        let workflow = parse_workflow(&body, "show prices", "hi").unwrap();
        assert_eq!(workflow.intent, "dynamic_workflow");
        assert_eq!(workflow.language, "hi");
        assert_eq!(workflow.translated_input, "show prices");
        assert_eq!(workflow.steps.len(), 2);
    }

    #[test]
    fn test_parse_workflow_empty_or_missing_is_none() {
        assert!(parse_workflow(&json!({"workflow": []}), "x", "en").is_none());
        assert!(parse_workflow(&json!({}), "x", "en").is_none());
        assert!(parse_workflow(&json!({"workflow": "nope"}), "x", "en").is_none());
    }

    #[test]
    fn test_parse_workflow_bad_steps_is_none() {
        let body = json!({"workflow": [{"action": "launch_rocket"}]});
        assert!(parse_workflow(&body, "x", "en").is_none());
    }

    #[test]
    fn test_parse_task_reply_from_actions() {
        let body = json!({
            "actions": [
                {"type": "speak", "message": "Tomato is at 45 rupees.", "suggestions": ["Open market trends"]}
            ],
            "status": "ok"
        });
        let reply = parse_task_reply(&body).unwrap();
        assert_eq!(reply.message, "Tomato is at 45 rupees.");
        assert_eq!(reply.suggestions, vec!["Open market trends".to_string()]);
    }

    #[test]
    fn test_parse_task_reply_top_level_message_fallback() {
        let body = json!({"message": "Done."});
        assert_eq!(parse_task_reply(&body).unwrap().message, "Done.");
    }

    #[test]
    fn test_parse_task_reply_without_message_is_protocol_error() {
        let body = json!({"actions": [], "status": "ok"});
        assert!(matches!(
            parse_task_reply(&body),
            Err(SessionError::Protocol(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let planner = HttpPlanner::new(Client::new(), "http://localhost:7860/");
        assert_eq!(
            planner.url("/api/tts/speak"),
            "http://localhost:7860/api/tts/speak"
        );
    }
}

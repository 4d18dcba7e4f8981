//! Event payloads exchanged over the in-process bus.
//!
//! Events are published by the workflow interpreter and the speech queue and
//! consumed by:
//! - The UI binding layer (navigation, autofill, clicks)
//! - The conversation controller (bot messages, playback completion)
//! - The speech queue (speak requests)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ConversationMessage;

/// All events that flow through the assistant's event bus.
///
/// Subscribers register by event name; `event_name()` is the routing key.
/// The `Custom` variant is the interpreter's `dispatch` extension point: a
/// planner-named event carrying the full step payload, so new UI behaviors
/// can be added without interpreter changes.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AssistantEvent {
    /// Navigate the host UI to a path.
    Navigate { path: String },

    /// Fill a named form field with a value.
    AutofillField { field: String, value: Value },

    /// Click a named UI target.
    ClickElement { target: String },

    /// Hand a file path to the host's upload affordance.
    UploadFile { file_path: String },

    /// Trigger the camera element identified by `selector`.
    TakePhoto { selector: String },

    /// Ask the host to refresh a status readout.
    CheckStatus { target: Option<String> },

    /// Queue text for speech playback.
    Speak { text: String },

    /// A bot message authored mid-workflow, for the chat UI and controller.
    WorkflowMessage { message: ConversationMessage },

    /// The active workflow ran its last step.
    WorkflowCompleted,

    /// One speech request settled (played, fell back, or failed silently).
    SpeechEnded,

    /// Planner-defined event carrying an arbitrary step payload.
    Custom { name: String, payload: Value },
}

impl AssistantEvent {
    /// Returns the event name used as the bus routing key.
    pub fn event_name(&self) -> &str {
        match self {
            AssistantEvent::Navigate { .. } => "navigate",
            AssistantEvent::AutofillField { .. } => "autofill-field",
            AssistantEvent::ClickElement { .. } => "click-element",
            AssistantEvent::UploadFile { .. } => "upload-file",
            AssistantEvent::TakePhoto { .. } => "take-photo",
            AssistantEvent::CheckStatus { .. } => "check-status",
            AssistantEvent::Speak { .. } => "speak",
            AssistantEvent::WorkflowMessage { .. } => "workflow-message",
            AssistantEvent::WorkflowCompleted => "workflow-completed",
            AssistantEvent::SpeechEnded => "speech-ended",
            AssistantEvent::Custom { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(
            AssistantEvent::Navigate {
                path: "/market-trends".to_string()
            }
            .event_name(),
            "navigate"
        );
        assert_eq!(
            AssistantEvent::Speak {
                text: "hello".to_string()
            }
            .event_name(),
            "speak"
        );
        assert_eq!(AssistantEvent::WorkflowCompleted.event_name(), "workflow-completed");
        assert_eq!(AssistantEvent::SpeechEnded.event_name(), "speech-ended");
    }

    #[test]
    fn test_custom_event_name_is_dynamic() {
        let event = AssistantEvent::Custom {
            name: "refresh-sensors".to_string(),
            payload: serde_json::json!({"field": "moisture"}),
        };
        assert_eq!(event.event_name(), "refresh-sensors");
    }

    #[test]
    fn test_event_serialization() {
        let event = AssistantEvent::AutofillField {
            field: "city".to_string(),
            value: serde_json::json!("Pune"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("AutofillField"));
        let rt: AssistantEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(rt.event_name(), "autofill-field");
    }

    #[test]
    fn test_workflow_message_round_trip() {
        let msg = ConversationMessage::bot("Which city?", Some("en"));
        let event = AssistantEvent::WorkflowMessage {
            message: msg.clone(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let rt: AssistantEvent = serde_json::from_str(&json).unwrap();
        match rt {
            AssistantEvent::WorkflowMessage { message } => {
                assert_eq!(message.id, msg.id);
                assert_eq!(message.content, "Which city?");
            }
            other => panic!("Expected WorkflowMessage, got {:?}", other),
        }
    }
}

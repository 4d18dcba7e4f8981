//! Workflow step and definition types.
//!
//! Steps are a tagged union keyed on `action`, matching the JSON the planner
//! emits. Branching variants (`if`, `loop`) carry their own nested step
//! sequences, so a workflow is a tree rather than a flat list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One unit of workflow behavior.
///
/// Unrecognized fields in the planner's JSON are ignored; `dispatch` instead
/// flattens them into its payload so the full step travels with the event.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorkflowStep {
    /// Navigate the host UI to `target`, optionally speaking on arrival.
    Navigate {
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speak: Option<String>,
    },

    /// Fill a named form field.
    Fill { field: String, value: Value },

    /// Click a named UI target.
    Click { target: String },

    /// Ask the user a question and suspend until an answer arrives.
    ///
    /// The answer is stored in collected data under `response_key`.
    #[serde(alias = "prompt-user")]
    AskUser {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected_response: Option<HashMap<String, String>>,
    },

    /// Execute the nested steps when `condition` evaluates true.
    If {
        condition: String,
        #[serde(default)]
        steps: Vec<WorkflowStep>,
    },

    /// Execute the nested steps exactly `count` times.
    Loop {
        count: u32,
        #[serde(default)]
        steps: Vec<WorkflowStep>,
    },

    /// Speak a message without suspending. Some planners put the text in
    /// `target` instead of `message`; both are accepted.
    Speak {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },

    /// Publish an arbitrary named event carrying the rest of the step.
    Dispatch {
        event: String,
        #[serde(flatten)]
        payload: Map<String, Value>,
    },

    /// Hand a file path to the host's upload affordance.
    UploadFile { file_path: String },

    /// Trigger the camera element identified by `camera_selector`.
    TakePhoto { camera_selector: String },

    /// Ask the host to refresh a status readout.
    CheckStatus {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },
}

/// A complete automation script for one recognized intent.
///
/// Immutable once created by the planner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub intent: String,
    pub language: String,
    /// The user's utterance after translation to the planner's language.
    #[serde(default)]
    pub translated_input: String,
    pub steps: Vec<WorkflowStep>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_navigate() {
        let step: WorkflowStep = serde_json::from_str(
            r#"{"action": "navigate", "target": "/market-trends", "speak": "Opening market trends"}"#,
        )
        .unwrap();
        match step {
            WorkflowStep::Navigate { target, speak } => {
                assert_eq!(target, "/market-trends");
                assert_eq!(speak.as_deref(), Some("Opening market trends"));
            }
            other => panic!("Expected Navigate, got {:?}", other),
        }
    }

    #[test]
    fn test_ask_user_accepts_prompt_user_alias() {
        let step: WorkflowStep = serde_json::from_str(
            r#"{"action": "prompt-user", "message": "Which city?", "response_key": "city"}"#,
        )
        .unwrap();
        assert!(matches!(step, WorkflowStep::AskUser { .. }));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let step: WorkflowStep = serde_json::from_str(
            r#"{"action": "click", "target": "submit", "confidence": 0.93, "note": "extra"}"#,
        )
        .unwrap();
        assert!(matches!(step, WorkflowStep::Click { .. }));
    }

    #[test]
    fn test_nested_step_tree() {
        let json = r#"{
            "action": "if",
            "condition": "n > 5",
            "steps": [
                {"action": "loop", "count": 2, "steps": [
                    {"action": "speak", "message": "hello"}
                ]}
            ]
        }"#;
        let step: WorkflowStep = serde_json::from_str(json).unwrap();
        match step {
            WorkflowStep::If { condition, steps } => {
                assert_eq!(condition, "n > 5");
                assert_eq!(steps.len(), 1);
                match &steps[0] {
                    WorkflowStep::Loop { count, steps } => {
                        assert_eq!(*count, 2);
                        assert_eq!(steps.len(), 1);
                    }
                    other => panic!("Expected Loop, got {:?}", other),
                }
            }
            other => panic!("Expected If, got {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_flattens_payload() {
        let step: WorkflowStep = serde_json::from_str(
            r#"{"action": "dispatch", "event": "refresh-sensors", "field": "moisture", "depth": 3}"#,
        )
        .unwrap();
        match step {
            WorkflowStep::Dispatch { event, payload } => {
                assert_eq!(event, "refresh-sensors");
                assert_eq!(payload.get("field"), Some(&Value::from("moisture")));
                assert_eq!(payload.get("depth"), Some(&Value::from(3)));
            }
            other => panic!("Expected Dispatch, got {:?}", other),
        }
    }

    #[test]
    fn test_definition_round_trip() {
        let json = r#"{
            "intent": "dynamic_workflow",
            "language": "hi",
            "translated_input": "check tomato price",
            "steps": [
                {"action": "navigate", "target": "/market-trends"},
                {"action": "check_status"}
            ]
        }"#;
        let def: WorkflowDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.intent, "dynamic_workflow");
        assert_eq!(def.language, "hi");
        assert_eq!(def.steps.len(), 2);

        let back = serde_json::to_string(&def).unwrap();
        let rt: WorkflowDefinition = serde_json::from_str(&back).unwrap();
        assert_eq!(rt.steps.len(), 2);
    }

    #[test]
    fn test_missing_translated_input_defaults_empty() {
        let def: WorkflowDefinition = serde_json::from_str(
            r#"{"intent": "x", "language": "en", "steps": []}"#,
        )
        .unwrap();
        assert!(def.translated_input.is_empty());
        assert!(def.steps.is_empty());
    }
}

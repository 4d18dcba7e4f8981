//! Resumable workflow interpreter.
//!
//! Execution walks the step tree using an explicit frame stack: entering an
//! `if` or `loop` pushes a frame, exhausting one pops it. The stack makes the
//! walk suspendable at any depth: an `ask_user` step records which data key
//! the answer belongs to, leaves the stack in place, and returns control to
//! the caller. [`Interpreter::resume`] stores the answer and continues from
//! the exact suspension point.
//!
//! Step failures never escape as errors. The interpreter converts them into
//! a spoken and displayed message and enters the paused(errored) state, from
//! which only [`Interpreter::reset`] recovers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use bheema_core::{AssistantEvent, ConversationMessage, EventBus};

use crate::error::WorkflowError;
use crate::expr;
use crate::step::{WorkflowDefinition, WorkflowStep};

/// One level of the execution stack.
///
/// A plain sequence (the workflow body, or an `if` branch) has
/// `remaining == 1`. A `loop` frame replays its steps until `remaining`
/// reaches zero.
#[derive(Clone, Debug)]
struct Frame {
    steps: Vec<WorkflowStep>,
    index: usize,
    remaining: u32,
}

impl Frame {
    fn sequence(steps: Vec<WorkflowStep>) -> Self {
        Self {
            steps,
            index: 0,
            remaining: 1,
        }
    }

    fn repeat(steps: Vec<WorkflowStep>, count: u32) -> Self {
        Self {
            steps,
            index: 0,
            remaining: count,
        }
    }
}

/// Snapshot of where a suspended workflow stands.
#[derive(Clone, Debug, Default)]
struct ExecutionState {
    frames: Vec<Frame>,
    collected: HashMap<String, Value>,
    paused: bool,
    errored: bool,
    /// Data key the next resume answer is stored under.
    pending_key: Option<String>,
}

/// Walks a [`WorkflowDefinition`], publishing events on the bus.
///
/// All mutation goes through `&self` behind a mutex, so the interpreter can
/// be shared (`Arc`) between the controller and bus subscriptions.
pub struct Interpreter {
    bus: Arc<EventBus>,
    workflow: Mutex<Option<WorkflowDefinition>>,
    state: Mutex<ExecutionState>,
}

impl Interpreter {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            workflow: Mutex::new(None),
            state: Mutex::new(ExecutionState::default()),
        }
    }

    /// Begin executing a workflow, replacing any previous one.
    ///
    /// Returns the closing message when the workflow ran to completion
    /// without suspending, `None` when it suspended at a question or failed.
    pub fn start(&self, workflow: WorkflowDefinition) -> Option<String> {
        tracing::info!(intent = %workflow.intent, steps = workflow.steps.len(), "Starting workflow");
        {
            let mut state = self.state.lock().expect("interpreter state mutex poisoned");
            *state = ExecutionState::default();
            state.frames.push(Frame::sequence(workflow.steps.clone()));
        }
        *self.workflow.lock().expect("interpreter workflow mutex poisoned") = Some(workflow);
        self.run()
    }

    /// Deliver the user's answer to a suspended `ask_user` step and continue.
    ///
    /// Ignored unless the interpreter is paused awaiting input; in the
    /// errored state the answer is dropped and `None` returned.
    pub fn resume(&self, input: &str) -> Option<String> {
        let stored = {
            let mut state = self.state.lock().expect("interpreter state mutex poisoned");
            if !state.paused || state.errored {
                tracing::debug!("Resume ignored; interpreter is not awaiting input");
                return None;
            }
            state.paused = false;
            state.pending_key.take().map(|key| {
                let value = Value::String(input.trim().to_string());
                state.collected.insert(key.clone(), value.clone());
                (key, value)
            })
        };
        if let Some((field, value)) = stored {
            self.bus.publish(&AssistantEvent::AutofillField { field, value });
        }
        self.run()
    }

    /// Abandon the active workflow and clear all state.
    pub fn reset(&self) {
        *self.workflow.lock().expect("interpreter workflow mutex poisoned") = None;
        *self.state.lock().expect("interpreter state mutex poisoned") = ExecutionState::default();
    }

    /// True while a workflow is loaded, whether running, paused, or errored.
    pub fn is_active(&self) -> bool {
        self.workflow.lock().expect("interpreter workflow mutex poisoned").is_some()
    }

    /// True when suspended awaiting a user answer (not when errored).
    pub fn is_awaiting_input(&self) -> bool {
        let state = self.state.lock().expect("interpreter state mutex poisoned");
        state.paused && !state.errored
    }

    pub fn is_errored(&self) -> bool {
        self.state.lock().expect("interpreter state mutex poisoned").errored
    }

    /// Copy of the data collected so far.
    pub fn collected(&self) -> HashMap<String, Value> {
        self.state.lock().expect("interpreter state mutex poisoned").collected.clone()
    }

    // =========================================================================
    // Execution loop
    // =========================================================================

    /// Drive the frame stack forward until it suspends, fails, or empties.
    fn run(&self) -> Option<String> {
        loop {
            let step = {
                let mut state = self.state.lock().expect("interpreter state mutex poisoned");
                match Self::advance(&mut state) {
                    Some(step) => step,
                    None => break,
                }
            };

            match self.execute(&step) {
                Ok(StepOutcome::Continue) => {}
                Ok(StepOutcome::Suspend) => return None,
                Err(e) => {
                    self.fail(e);
                    return None;
                }
            }
        }
        self.complete()
    }

    /// Yield the next step, popping exhausted frames and rewinding loop
    /// frames with iterations left.
    fn advance(state: &mut ExecutionState) -> Option<WorkflowStep> {
        loop {
            let frame = state.frames.last_mut()?;
            if frame.index < frame.steps.len() {
                let step = frame.steps[frame.index].clone();
                frame.index += 1;
                return Some(step);
            }
            frame.remaining = frame.remaining.saturating_sub(1);
            if frame.remaining > 0 {
                frame.index = 0;
            } else {
                state.frames.pop();
            }
        }
    }

    fn execute(&self, step: &WorkflowStep) -> Result<StepOutcome, WorkflowError> {
        let language = self.language();
        match step {
            WorkflowStep::Navigate { target, speak } => {
                let path = self.substitute(target);
                if path.trim().is_empty() {
                    return Err(WorkflowError::TargetNotFound("navigation target".to_string()));
                }
                tracing::debug!(path = %path, "Workflow step: navigate");
                self.bus.publish(&AssistantEvent::Navigate { path });
                if let Some(text) = speak {
                    self.say(&self.substitute(text), &language);
                }
                Ok(StepOutcome::Continue)
            }

            WorkflowStep::Fill { field, value } => {
                if field.trim().is_empty() {
                    return Err(WorkflowError::TargetNotFound("form field".to_string()));
                }
                let value = self.substitute_value(value);
                tracing::debug!(field = %field, "Workflow step: fill");
                self.bus.publish(&AssistantEvent::AutofillField {
                    field: field.clone(),
                    value,
                });
                Ok(StepOutcome::Continue)
            }

            WorkflowStep::Click { target } => {
                let target = self.substitute(target);
                if target.trim().is_empty() {
                    return Err(WorkflowError::TargetNotFound("click target".to_string()));
                }
                tracing::debug!(target = %target, "Workflow step: click");
                self.bus.publish(&AssistantEvent::ClickElement { target });
                Ok(StepOutcome::Continue)
            }

            WorkflowStep::AskUser {
                message,
                response_key,
                expected_response: _,
            } => {
                let prompt = message
                    .as_deref()
                    .ok_or_else(|| WorkflowError::InvalidStep("ask_user without message".to_string()))?;
                let prompt = self.substitute(prompt);
                {
                    let mut state = self.state.lock().expect("interpreter state mutex poisoned");
                    state.paused = true;
                    state.pending_key = Some(
                        response_key
                            .clone()
                            .unwrap_or_else(|| "response".to_string()),
                    );
                }
                tracing::info!("Workflow suspended awaiting user input");
                self.say(&prompt, &language);
                Ok(StepOutcome::Suspend)
            }

            WorkflowStep::If { condition, steps } => {
                let collected = self.collected();
                if expr::evaluate(condition, &collected) {
                    tracing::debug!(condition = %condition, "Condition true; entering branch");
                    self.state
                        .lock()
                        .expect("interpreter state mutex poisoned")
                        .frames
                        .push(Frame::sequence(steps.clone()));
                } else {
                    tracing::debug!(condition = %condition, "Condition false; skipping branch");
                }
                Ok(StepOutcome::Continue)
            }

            WorkflowStep::Loop { count, steps } => {
                if *count > 0 && !steps.is_empty() {
                    self.state
                        .lock()
                        .expect("interpreter state mutex poisoned")
                        .frames
                        .push(Frame::repeat(steps.clone(), *count));
                }
                Ok(StepOutcome::Continue)
            }

            WorkflowStep::Speak { message, target } => {
                let text = message
                    .as_deref()
                    .or(target.as_deref())
                    .ok_or_else(|| WorkflowError::InvalidStep("speak without message".to_string()))?;
                self.say(&self.substitute(text), &language);
                Ok(StepOutcome::Continue)
            }

            WorkflowStep::Dispatch { event, payload } => {
                tracing::debug!(event = %event, "Workflow step: dispatch");
                self.bus.publish(&AssistantEvent::Custom {
                    name: event.clone(),
                    payload: Value::Object(payload.clone()),
                });
                Ok(StepOutcome::Continue)
            }

            WorkflowStep::UploadFile { file_path } => {
                self.bus.publish(&AssistantEvent::UploadFile {
                    file_path: self.substitute(file_path),
                });
                Ok(StepOutcome::Continue)
            }

            WorkflowStep::TakePhoto { camera_selector } => {
                self.bus.publish(&AssistantEvent::TakePhoto {
                    selector: camera_selector.clone(),
                });
                Ok(StepOutcome::Continue)
            }

            WorkflowStep::CheckStatus { target } => {
                self.bus.publish(&AssistantEvent::CheckStatus {
                    target: target.clone(),
                });
                Ok(StepOutcome::Continue)
            }
        }
    }

    /// Finish a workflow whose frame stack emptied.
    fn complete(&self) -> Option<String> {
        let intent = {
            let mut workflow = self.workflow.lock().expect("interpreter workflow mutex poisoned");
            workflow.take()?.intent
        };
        *self.state.lock().expect("interpreter state mutex poisoned") = ExecutionState::default();
        tracing::info!(intent = %intent, "Workflow completed");
        self.bus.publish(&AssistantEvent::WorkflowCompleted);
        Some("I have completed the task.".to_string())
    }

    /// Convert a step failure into a spoken and displayed message, leaving
    /// the interpreter paused in the errored state.
    fn fail(&self, error: WorkflowError) {
        tracing::warn!(error = %error, "Workflow step failed");
        {
            let mut state = self.state.lock().expect("interpreter state mutex poisoned");
            state.paused = true;
            state.errored = true;
            state.pending_key = None;
        }
        let text = match &error {
            WorkflowError::TargetNotFound(what) => format!(
                "I could not find the {} I needed on this page. Please try again from the relevant screen.",
                what
            ),
            other => format!("Something went wrong while I was working: {}. Please try again.", other),
        };
        let language = self.language();
        self.say(&text, &language);
    }

    fn language(&self) -> Option<String> {
        self.workflow
            .lock()
            .expect("interpreter workflow mutex poisoned")
            .as_ref()
            .map(|w| w.language.clone())
    }

    /// Speak a message aloud and surface it in the conversation.
    fn say(&self, text: &str, language: &Option<String>) {
        self.bus.publish(&AssistantEvent::Speak {
            text: text.to_string(),
        });
        self.bus.publish(&AssistantEvent::WorkflowMessage {
            message: ConversationMessage::bot(text, language.as_deref()),
        });
    }

    /// Replace `{key}` placeholders with collected data. Unknown keys are
    /// left verbatim so a partially filled message is still readable.
    fn substitute(&self, template: &str) -> String {
        let collected = self.collected();
        substitute_placeholders(template, &collected)
    }

    fn substitute_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.substitute(s)),
            other => other.clone(),
        }
    }
}

enum StepOutcome {
    Continue,
    Suspend,
}

fn substitute_placeholders(template: &str, data: &HashMap<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match tail.find('}') {
            Some(close) => {
                let key = &tail[1..close];
                match data.get(key) {
                    Some(Value::String(s)) => out.push_str(s),
                    Some(other) => out.push_str(&other.to_string()),
                    None => out.push_str(&tail[..=close]),
                }
                rest = &tail[close + 1..];
            }
            None => {
                out.push_str(tail);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn workflow(steps_json: &str) -> WorkflowDefinition {
        let steps: Vec<WorkflowStep> = serde_json::from_str(steps_json).unwrap();
        WorkflowDefinition {
            intent: "test".to_string(),
            language: "en".to_string(),
            translated_input: String::new(),
            steps,
        }
    }

    /// Bus with a recorder subscribed to the given event names.
    fn recording_bus(names: &[&str]) -> (Arc<EventBus>, Arc<Mutex<Vec<AssistantEvent>>>) {
        let bus = Arc::new(EventBus::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in names {
            let log_clone = Arc::clone(&log);
            bus.subscribe(name, move |event| {
                log_clone.lock().unwrap().push(event.clone());
                Ok(())
            });
        }
        (bus, log)
    }

    fn spoken_texts(log: &Arc<Mutex<Vec<AssistantEvent>>>) -> Vec<String> {
        log.lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                AssistantEvent::Speak { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    // ---- linear execution ----

    #[test]
    fn test_linear_workflow_runs_to_completion() {
        let (bus, log) = recording_bus(&["navigate", "click-element", "workflow-completed"]);
        let interp = Interpreter::new(Arc::clone(&bus));

        let result = interp.start(workflow(
            r#"[
                {"action": "navigate", "target": "/market-trends"},
                {"action": "click", "target": "refresh"}
            ]"#,
        ));

        assert_eq!(result.as_deref(), Some("I have completed the task."));
        assert!(!interp.is_active());

        let events = log.lock().unwrap();
        assert!(matches!(&events[0], AssistantEvent::Navigate { path } if path == "/market-trends"));
        assert!(matches!(&events[1], AssistantEvent::ClickElement { target } if target == "refresh"));
        assert!(matches!(&events[2], AssistantEvent::WorkflowCompleted));
    }

    #[test]
    fn test_completion_event_published_exactly_once() {
        let (bus, log) = recording_bus(&["workflow-completed"]);
        let interp = Interpreter::new(bus);

        interp.start(workflow(r#"[{"action": "check_status"}]"#));
        assert_eq!(log.lock().unwrap().len(), 1);

        // A second start completes again; still one event per run.
        interp.start(workflow(r#"[{"action": "check_status"}]"#));
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_navigate_with_speak_publishes_both() {
        let (bus, log) = recording_bus(&["speak", "workflow-message"]);
        let interp = Interpreter::new(bus);

        interp.start(workflow(
            r#"[{"action": "navigate", "target": "/weather", "speak": "Opening weather"}]"#,
        ));

        assert_eq!(spoken_texts(&log), vec!["Opening weather".to_string()]);
        let messages = log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, AssistantEvent::WorkflowMessage { .. }))
            .count();
        assert_eq!(messages, 1);
    }

    // ---- suspension and resumption ----

    #[test]
    fn test_ask_user_suspends_and_resume_continues() {
        let (bus, log) = recording_bus(&["speak", "autofill-field", "workflow-completed"]);
        let interp = Interpreter::new(bus);

        let result = interp.start(workflow(
            r#"[
                {"action": "ask_user", "message": "Which city?", "response_key": "city"},
                {"action": "speak", "message": "Checking weather for {city}"}
            ]"#,
        ));
        assert!(result.is_none());
        assert!(interp.is_awaiting_input());
        assert_eq!(spoken_texts(&log), vec!["Which city?".to_string()]);

        let result = interp.resume("Pune");
        assert_eq!(result.as_deref(), Some("I have completed the task."));
        assert!(!interp.is_active());
        assert_eq!(
            spoken_texts(&log),
            vec!["Which city?".to_string(), "Checking weather for Pune".to_string()]
        );

        // The answer was also autofilled into the host form.
        let autofills: Vec<_> = log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                AssistantEvent::AutofillField { field, value } => {
                    Some((field.clone(), value.clone()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(autofills, vec![("city".to_string(), json!("Pune"))]);
    }

    #[test]
    fn test_resume_when_not_paused_is_ignored() {
        let (bus, log) = recording_bus(&["autofill-field"]);
        let interp = Interpreter::new(bus);

        assert!(interp.resume("stray answer").is_none());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_second_resume_after_answer_is_ignored() {
        let (bus, _log) = recording_bus(&[]);
        let interp = Interpreter::new(bus);

        interp.start(workflow(
            r#"[
                {"action": "ask_user", "message": "How many acres?", "response_key": "acres"},
                {"action": "ask_user", "message": "Which crop?", "response_key": "crop"}
            ]"#,
        ));
        interp.resume("5");
        assert!(interp.is_awaiting_input());
        interp.resume("wheat");
        assert!(!interp.is_active());

        // Workflow is gone; further answers fall on the floor.
        assert!(interp.resume("extra").is_none());
    }

    #[test]
    fn test_nested_ask_user_inside_if_resumes_in_place() {
        let (bus, log) = recording_bus(&["speak"]);
        let interp = Interpreter::new(bus);

        interp.start(workflow(
            r#"[
                {"action": "ask_user", "message": "How many bags?", "response_key": "n"},
                {"action": "if", "condition": "n > 5", "steps": [
                    {"action": "ask_user", "message": "Bulk order. Confirm?", "response_key": "confirm"},
                    {"action": "speak", "message": "Confirmed {confirm}"}
                ]},
                {"action": "speak", "message": "Done"}
            ]"#,
        ));

        interp.resume("10");
        assert!(interp.is_awaiting_input());
        interp.resume("yes");
        assert!(!interp.is_active());
        assert_eq!(
            spoken_texts(&log),
            vec![
                "How many bags?".to_string(),
                "Bulk order. Confirm?".to_string(),
                "Confirmed yes".to_string(),
                "Done".to_string()
            ]
        );
    }

    // ---- branching and loops ----

    #[test]
    fn test_if_branch_skipped_when_condition_false() {
        let (bus, log) = recording_bus(&["speak"]);
        let interp = Interpreter::new(bus);

        interp.start(workflow(
            r#"[
                {"action": "ask_user", "message": "How many?", "response_key": "n"},
                {"action": "if", "condition": "n > 5", "steps": [
                    {"action": "speak", "message": "big"}
                ]},
                {"action": "speak", "message": "after"}
            ]"#,
        ));
        interp.resume("3");

        assert_eq!(
            spoken_texts(&log),
            vec!["How many?".to_string(), "after".to_string()]
        );
    }

    #[test]
    fn test_loop_repeats_body_count_times() {
        let (bus, log) = recording_bus(&["speak"]);
        let interp = Interpreter::new(bus);

        interp.start(workflow(
            r#"[
                {"action": "loop", "count": 3, "steps": [
                    {"action": "speak", "message": "tick"}
                ]},
                {"action": "speak", "message": "done"}
            ]"#,
        ));

        assert_eq!(spoken_texts(&log), vec!["tick", "tick", "tick", "done"]);
    }

    #[test]
    fn test_zero_count_loop_is_skipped() {
        let (bus, log) = recording_bus(&["speak", "workflow-completed"]);
        let interp = Interpreter::new(bus);

        let result = interp.start(workflow(
            r#"[{"action": "loop", "count": 0, "steps": [
                {"action": "speak", "message": "never"}
            ]}]"#,
        ));

        assert_eq!(result.as_deref(), Some("I have completed the task."));
        assert!(spoken_texts(&log).is_empty());
    }

    #[test]
    fn test_malformed_condition_skips_branch() {
        let (bus, log) = recording_bus(&["speak"]);
        let interp = Interpreter::new(bus);

        let result = interp.start(workflow(
            r#"[
                {"action": "if", "condition": "n >", "steps": [
                    {"action": "speak", "message": "unreachable"}
                ]},
                {"action": "speak", "message": "survived"}
            ]"#,
        ));

        assert!(result.is_some());
        assert_eq!(spoken_texts(&log), vec!["survived".to_string()]);
    }

    // ---- placeholders ----

    #[test]
    fn test_placeholder_substitution_in_fill_and_navigate() {
        let (bus, log) = recording_bus(&["autofill-field", "navigate"]);
        let interp = Interpreter::new(bus);

        interp.start(workflow(
            r#"[
                {"action": "ask_user", "message": "City?", "response_key": "city"},
                {"action": "navigate", "target": "/weather/{city}"},
                {"action": "fill", "field": "location", "value": "{city}"}
            ]"#,
        ));
        interp.resume("Pune");

        let events = log.lock().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, AssistantEvent::Navigate { path } if path == "/weather/Pune")));
        assert!(events.iter().any(|e| matches!(
            e,
            AssistantEvent::AutofillField { field, value }
                if field == "location" && value == &json!("Pune")
        )));
    }

    #[test]
    fn test_unknown_placeholder_left_verbatim() {
        let data = HashMap::from([("city".to_string(), json!("Pune"))]);
        assert_eq!(
            substitute_placeholders("Weather for {city} in {state}", &data),
            "Weather for Pune in {state}"
        );
        assert_eq!(substitute_placeholders("no braces", &data), "no braces");
        assert_eq!(substitute_placeholders("dangling {open", &data), "dangling {open");
    }

    // ---- failure handling ----

    #[test]
    fn test_empty_click_target_enters_errored_state() {
        let (bus, log) = recording_bus(&["speak", "workflow-completed"]);
        let interp = Interpreter::new(bus);

        let result = interp.start(workflow(
            r#"[
                {"action": "click", "target": "  "},
                {"action": "speak", "message": "unreachable"}
            ]"#,
        ));

        assert!(result.is_none());
        assert!(interp.is_errored());
        assert!(interp.is_active());
        assert!(!interp.is_awaiting_input());

        let spoken = spoken_texts(&log);
        assert_eq!(spoken.len(), 1);
        assert!(spoken[0].contains("could not find"));
        // No completion event on failure.
        assert!(!log
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, AssistantEvent::WorkflowCompleted)));
    }

    #[test]
    fn test_errored_interpreter_ignores_resume_until_reset() {
        let (bus, _log) = recording_bus(&[]);
        let interp = Interpreter::new(bus);

        interp.start(workflow(r#"[{"action": "click", "target": ""}]"#));
        assert!(interp.is_errored());
        assert!(interp.resume("hello?").is_none());
        assert!(interp.is_errored());

        interp.reset();
        assert!(!interp.is_active());
        assert!(!interp.is_errored());

        // A fresh workflow runs normally after reset.
        let result = interp.start(workflow(r#"[{"action": "check_status"}]"#));
        assert!(result.is_some());
    }

    #[test]
    fn test_ask_user_without_message_fails() {
        let (bus, log) = recording_bus(&["speak"]);
        let interp = Interpreter::new(bus);

        interp.start(workflow(r#"[{"action": "ask_user", "response_key": "x"}]"#));
        assert!(interp.is_errored());
        assert!(spoken_texts(&log)[0].contains("Something went wrong"));
    }

    // ---- dispatch and misc steps ----

    #[test]
    fn test_dispatch_publishes_custom_event_with_payload() {
        let (bus, log) = recording_bus(&["refresh-sensors"]);
        let interp = Interpreter::new(bus);

        interp.start(workflow(
            r#"[{"action": "dispatch", "event": "refresh-sensors", "depth": 3}]"#,
        ));

        let events = log.lock().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            AssistantEvent::Custom { name, payload } => {
                assert_eq!(name, "refresh-sensors");
                assert_eq!(payload.get("depth"), Some(&json!(3)));
            }
            other => panic!("Expected Custom, got {:?}", other),
        }
    }

    #[test]
    fn test_speak_accepts_target_as_message() {
        let (bus, log) = recording_bus(&["speak"]);
        let interp = Interpreter::new(bus);

        interp.start(workflow(r#"[{"action": "speak", "target": "Hello there"}]"#));
        assert_eq!(spoken_texts(&log), vec!["Hello there".to_string()]);
    }

    #[test]
    fn test_upload_photo_and_status_steps() {
        let (bus, log) = recording_bus(&["upload-file", "take-photo", "check-status"]);
        let interp = Interpreter::new(bus);

        interp.start(workflow(
            r##"[
                {"action": "upload_file", "file_path": "/tmp/leaf.jpg"},
                {"action": "take_photo", "camera_selector": "#disease-camera"},
                {"action": "check_status", "target": "soil-report"}
            ]"##,
        ));

        let events = log.lock().unwrap();
        assert!(matches!(&events[0], AssistantEvent::UploadFile { file_path } if file_path == "/tmp/leaf.jpg"));
        assert!(matches!(&events[1], AssistantEvent::TakePhoto { selector } if selector == "#disease-camera"));
        assert!(matches!(&events[2], AssistantEvent::CheckStatus { target } if target.as_deref() == Some("soil-report")));
    }

    #[test]
    fn test_collected_data_snapshot() {
        let (bus, _log) = recording_bus(&[]);
        let interp = Interpreter::new(bus);

        interp.start(workflow(
            r#"[
                {"action": "ask_user", "message": "Crop?", "response_key": "crop"},
                {"action": "ask_user", "message": "Acres?", "response_key": "acres"}
            ]"#,
        ));
        interp.resume("wheat");
        assert_eq!(interp.collected().get("crop"), Some(&json!("wheat")));
    }
}

//! Conversation controller.
//!
//! Routes each user submission through, in order: a suspended workflow
//! awaiting an answer, the local shortcut classifier, and finally the remote
//! planner (workflow generation with a single-turn task fallback). Owns the
//! transcript, the assistant [`Status`], and the remote session handshake.
//!
//! The controller never surfaces planner failures as errors to its caller.
//! Every failure path becomes a spoken and displayed apology, followed by a
//! timed recovery back to Idle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::timeout;

use bheema_core::config::BheemaConfig;
use bheema_core::{AssistantEvent, ConversationMessage, EventBus, SubscriptionId};
use bheema_speech::SpeechQueue;
use bheema_workflow::Interpreter;

use crate::error::SessionError;
use crate::planner::{Attachment, Planner};
use crate::shortcuts;
use crate::status::{Status, StatusMachine};

/// What the host should do after the assistant finishes speaking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Nothing to do; the conversation is idle.
    None,
    /// Reopen audio capture; the assistant expects the user to answer.
    ReopenCapture,
}

/// Central conversation orchestrator.
///
/// All mutation goes through `&self` behind mutexes, so the controller can
/// be shared (`Arc`) between the input loop and bus subscriptions.
pub struct Controller {
    bus: Arc<EventBus>,
    planner: Arc<dyn Planner>,
    interpreter: Arc<Interpreter>,
    speech: Arc<SpeechQueue>,
    status: StatusMachine,
    user_id: String,
    handshake_attempts: u32,
    handshake_interval: Duration,
    task_timeout: Duration,
    error_recovery: Duration,
    language: Mutex<String>,
    session_id: Mutex<Option<String>>,
    transcript: Arc<Mutex<Vec<ConversationMessage>>>,
    voice_turn: Mutex<bool>,
}

impl Controller {
    pub fn new(
        bus: Arc<EventBus>,
        planner: Arc<dyn Planner>,
        interpreter: Arc<Interpreter>,
        speech: Arc<SpeechQueue>,
        config: &BheemaConfig,
    ) -> Self {
        speech.set_language(&config.general.language);
        Self {
            bus,
            planner,
            interpreter,
            speech,
            status: StatusMachine::new(),
            user_id: config.general.user_id.clone(),
            handshake_attempts: config.session.handshake_attempts,
            handshake_interval: Duration::from_millis(config.session.handshake_interval_ms),
            task_timeout: Duration::from_secs(config.session.task_timeout_secs),
            error_recovery: Duration::from_secs(config.session.error_recovery_secs),
            language: Mutex::new(config.general.language.clone()),
            session_id: Mutex::new(None),
            transcript: Arc::new(Mutex::new(Vec::new())),
            voice_turn: Mutex::new(false),
        }
    }

    /// Subscribe the controller to workflow messages on the bus, so
    /// interpreter-authored bot messages land in the transcript.
    pub fn attach(&self) -> SubscriptionId {
        let transcript = Arc::clone(&self.transcript);
        self.bus.subscribe("workflow-message", move |event| {
            if let AssistantEvent::WorkflowMessage { message } = event {
                push_unique(&transcript, message.clone());
            }
            Ok(())
        })
    }

    pub fn status(&self) -> Status {
        self.status.current()
    }

    /// Copy of the conversation so far, oldest first.
    pub fn transcript(&self) -> Vec<ConversationMessage> {
        self.transcript.lock().expect("transcript mutex poisoned").clone()
    }

    /// Switch the conversation language for planner calls and speech.
    pub fn set_language(&self, code: &str) {
        tracing::info!(language = code, "Conversation language changed");
        *self.language.lock().expect("language mutex poisoned") = code.to_string();
        self.speech.set_language(code);
    }

    pub fn language(&self) -> String {
        self.language.lock().expect("language mutex poisoned").clone()
    }

    /// Signal that audio capture has opened.
    pub fn capture_opened(&self) {
        if self.status.transition(Status::Listening).is_err() {
            self.status.reset();
            let _ = self.status.transition(Status::Listening);
        }
    }

    // =========================================================================
    // Submission handling
    // =========================================================================

    /// Handle one user utterance or typed message.
    ///
    /// Returns the controller-authored reply, if any. Workflow-authored
    /// messages reach the transcript through the bus instead.
    pub async fn handle_submission(
        &self,
        text: &str,
        from_voice: bool,
    ) -> Option<ConversationMessage> {
        self.handle_submission_with_file(text, from_voice, None).await
    }

    /// Handle a submission that carries a photo or document. The attachment
    /// rides along to the planner, which routes it to disease analysis.
    pub async fn handle_submission_with_file(
        &self,
        text: &str,
        from_voice: bool,
        file: Option<Attachment>,
    ) -> Option<ConversationMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        tracing::info!(from_voice, "User submission: {}", text);
        self.append_message(ConversationMessage::user(text, from_voice));
        *self.voice_turn.lock().expect("voice turn mutex poisoned") = from_voice;
        self.begin_thinking();

        // A workflow waiting on an answer consumes the submission outright.
        // The interpreter speaks over the bus and the queue can settle
        // inline, so a voice turn must already read Speaking here.
        if self.interpreter.is_awaiting_input() {
            self.begin_speaking(from_voice);
            let closing = self.interpreter.resume(text);
            return self.finish_turn(closing, Vec::new(), from_voice).await;
        }

        // Local shortcuts answer without a planner round trip, and keep the
        // assistant useful before the session handshake lands.
        if let Some(reply) = shortcuts::classify(text) {
            return self.finish_turn(Some(reply.text), reply.suggestions, from_voice).await;
        }

        let session_id = match self.ensure_session(text).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Session handshake failed");
                return self
                    .fail_turn(
                        "I'm still getting ready. Please try again in a moment.",
                        from_voice,
                    )
                    .await;
            }
        };

        let language = self.language();
        match self.plan(&session_id, text, &language, file.as_ref()).await {
            Ok(Some(workflow)) => {
                self.begin_speaking(from_voice);
                let closing = self.interpreter.start(workflow);
                self.finish_turn(closing, Vec::new(), from_voice).await
            }
            Ok(None) => {
                // A photo with no workflow is a disease snapshot.
                let task_type = if file.is_some() {
                    "disease_analysis"
                } else {
                    "general_query"
                };
                let task =
                    self.planner
                        .execute_task(&session_id, task_type, text, &language, file.as_ref());
                match timeout(self.task_timeout, task).await {
                    Ok(Ok(reply)) => {
                        self.finish_turn(Some(reply.message), reply.suggestions, from_voice).await
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "Task execution failed");
                        self.fail_turn(
                            "I could not finish that request. Please try again.",
                            from_voice,
                        )
                        .await
                    }
                    Err(_) => {
                        tracing::warn!("Task execution timed out");
                        self.fail_turn(
                            "That took longer than expected. Please try again.",
                            from_voice,
                        )
                        .await
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Workflow generation failed");
                self.fail_turn("I could not work out how to do that. Please try again.", from_voice)
                    .await
            }
        }
    }

    /// React to the speech queue going quiet.
    ///
    /// Mid-turn `speech-ended` events (more requests still queued) are
    /// ignored; only the end of the turn moves the status machine.
    pub fn handle_speech_ended(&self) -> Directive {
        if self.speech.pending_len() > 0 {
            return Directive::None;
        }
        if self.status.current() != Status::Speaking {
            return Directive::None;
        }

        let voice = *self.voice_turn.lock().expect("voice turn mutex poisoned");
        let reopen = voice && self.interpreter.is_awaiting_input();
        if reopen {
            let _ = self.status.transition(Status::Listening);
            Directive::ReopenCapture
        } else {
            let _ = self.status.transition(Status::Idle);
            Directive::None
        }
    }

    /// Abandon the active workflow and return to Idle.
    pub async fn cancel(&self) {
        tracing::info!("Conversation cancelled");
        self.interpreter.reset();
        self.speech.flush();
        self.speech.cancel().await;
        self.status.reset();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn begin_thinking(&self) {
        if self.status.transition(Status::Thinking).is_err() {
            self.status.reset();
            let _ = self.status.transition(Status::Thinking);
        }
    }

    /// Open the remote session if not already open, retrying while the
    /// backend agent warms up.
    async fn ensure_session(&self, initial_task: &str) -> Result<String, SessionError> {
        if let Some(id) = self.session_id.lock().expect("session mutex poisoned").clone() {
            return Ok(id);
        }

        let language = self.language();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .planner
                .start_session(&self.user_id, initial_task, &language)
                .await
            {
                Ok(id) => {
                    tracing::info!(session_id = %id, "Planner session established");
                    *self.session_id.lock().expect("session mutex poisoned") = Some(id.clone());
                    return Ok(id);
                }
                Err(SessionError::NotReady) if attempt < self.handshake_attempts => {
                    tracing::debug!(attempt, "Planner not ready; retrying handshake");
                    tokio::time::sleep(self.handshake_interval).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn plan(
        &self,
        session_id: &str,
        text: &str,
        language: &str,
        file: Option<&Attachment>,
    ) -> Result<Option<bheema_workflow::WorkflowDefinition>, SessionError> {
        timeout(
            self.task_timeout,
            self.planner.generate_workflow(session_id, text, language, file),
        )
        .await
        .map_err(|_| SessionError::Timeout(self.task_timeout.as_secs()))?
    }

    /// Move a voice turn into Speaking before anything can publish a speak
    /// event. Speech settles the instant it is queued, and a `speech-ended`
    /// handler that still observes Thinking would drop the turn's wakeup.
    fn begin_speaking(&self, from_voice: bool) {
        if from_voice {
            let _ = self.status.transition(Status::Speaking);
        }
    }

    /// Close out a successful turn: speak and record the reply when there is
    /// one, then settle the status machine.
    ///
    /// The Speaking transition comes before the enqueue. The queue drains
    /// inline when idle, so `speech-ended` can fire from inside the enqueue
    /// and its handler must already see Speaking.
    async fn finish_turn(
        &self,
        reply: Option<String>,
        suggestions: Vec<String>,
        from_voice: bool,
    ) -> Option<ConversationMessage> {
        self.begin_speaking(from_voice);

        let message = match reply {
            Some(text) => {
                let language = self.language();
                let message = ConversationMessage::bot(&text, Some(&language))
                    .with_suggestions(suggestions);
                self.append_message(message.clone());
                if from_voice {
                    self.speech.enqueue(&text, &language).await;
                }
                Some(message)
            }
            None => None,
        };

        if !from_voice {
            let _ = self.status.transition(Status::Idle);
        }
        message
    }

    /// Close out a failed turn with an apology and a timed recovery.
    async fn fail_turn(&self, apology: &str, from_voice: bool) -> Option<ConversationMessage> {
        let language = self.language();
        let message = ConversationMessage::bot(apology, Some(&language));
        self.append_message(message.clone());
        if from_voice {
            self.speech.enqueue(apology, &language).await;
        }
        let _ = self.status.transition(Status::Error);

        let status = self.status.clone();
        let recovery = self.error_recovery;
        tokio::spawn(async move {
            tokio::time::sleep(recovery).await;
            status.reset();
        });
        Some(message)
    }

    fn append_message(&self, message: ConversationMessage) {
        push_unique(&self.transcript, message);
    }
}

/// Append to the transcript unless a message with the same id is already
/// there. Controller replies and bus-delivered workflow messages can
/// otherwise cross paths.
fn push_unique(transcript: &Mutex<Vec<ConversationMessage>>, message: ConversationMessage) {
    let mut transcript = transcript.lock().expect("transcript mutex poisoned");
    if !transcript.iter().any(|m| m.id == message.id) {
        transcript.push(message);
    }
}

// =============================================================================
// Tests
// =============================================================================

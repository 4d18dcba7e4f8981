//! Assistant status state machine.
//!
//! Enforces valid transitions for the conversation lifecycle:
//! - Idle -> Listening (microphone opened)
//! - Idle -> Thinking (typed submission)
//! - Listening -> Thinking (utterance captured)
//! - Listening -> Idle (microphone closed without input)
//! - Thinking -> Speaking (reply queued for speech)
//! - Thinking -> Idle (silent reply, typed conversation)
//! - Speaking -> Listening (voice conversation reopens capture)
//! - Speaking -> Idle (playback finished, no follow-up expected)
//! - any non-Error -> Error, Error -> Idle (recovery)

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::SessionError;

/// What the assistant is doing right now, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Waiting for input.
    Idle,
    /// Microphone is open and capturing.
    Listening,
    /// A submission is being classified, planned, or executed.
    Thinking,
    /// The speech queue is playing a reply.
    Speaking,
    /// Something failed; the assistant will recover to Idle.
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => write!(f, "Idle"),
            Status::Listening => write!(f, "Listening"),
            Status::Thinking => write!(f, "Thinking"),
            Status::Speaking => write!(f, "Speaking"),
            Status::Error => write!(f, "Error"),
        }
    }
}

impl Status {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &Status) -> bool {
        matches!(
            (self, target),
            (Status::Idle, Status::Listening)
                | (Status::Idle, Status::Thinking)
                | (Status::Listening, Status::Thinking)
                | (Status::Listening, Status::Idle)
                | (Status::Thinking, Status::Speaking)
                | (Status::Thinking, Status::Idle)
                | (Status::Speaking, Status::Listening)
                | (Status::Speaking, Status::Idle)
                // Failure and recovery
                | (Status::Idle, Status::Error)
                | (Status::Listening, Status::Error)
                | (Status::Thinking, Status::Error)
                | (Status::Speaking, Status::Error)
                | (Status::Error, Status::Idle)
        )
    }
}

/// Thread-safe wrapper validating every status change.
#[derive(Debug, Clone)]
pub struct StatusMachine {
    status: Arc<Mutex<Status>>,
}

impl Default for StatusMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusMachine {
    /// Create a new machine initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            status: Arc::new(Mutex::new(Status::Idle)),
        }
    }

    pub fn current(&self) -> Status {
        *self.status.lock().expect("status mutex poisoned")
    }

    /// Attempt to transition to the target status.
    pub fn transition(&self, target: Status) -> Result<(), SessionError> {
        let mut status = self.status.lock().expect("status mutex poisoned");
        if status.can_transition_to(&target) {
            tracing::debug!("Assistant status: {} -> {}", *status, target);
            *status = target;
            Ok(())
        } else {
            Err(SessionError::Protocol(format!(
                "Invalid status transition: {} -> {}",
                *status, target
            )))
        }
    }

    /// Force the machine back to Idle (error recovery).
    pub fn reset(&self) {
        let mut status = self.status.lock().expect("status mutex poisoned");
        if *status != Status::Idle {
            tracing::debug!("Assistant status reset to Idle from {}", *status);
            *status = Status::Idle;
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
    fn test_status_display() {
        assert_eq!(Status::Idle.to_string(), "Idle");
        assert_eq!(Status::Listening.to_string(), "Listening");
        assert_eq!(Status::Thinking.to_string(), "Thinking");
        assert_eq!(Status::Speaking.to_string(), "Speaking");
        assert_eq!(Status::Error.to_string(), "Error");
    }

    #[test]
    fn test_voice_conversation_cycle() {
        // Listening -> Thinking -> Speaking -> Listening loops indefinitely.
        assert!(Status::Idle.can_transition_to(&Status::Listening));
        assert!(Status::Listening.can_transition_to(&Status::Thinking));
        assert!(Status::Thinking.can_transition_to(&Status::Speaking));
        assert!(Status::Speaking.can_transition_to(&Status::Listening));
    }

    #[test]
    fn test_typed_conversation_path() {
        assert!(Status::Idle.can_transition_to(&Status::Thinking));
        assert!(Status::Thinking.can_transition_to(&Status::Idle));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!Status::Idle.can_transition_to(&Status::Speaking));
        assert!(!Status::Speaking.can_transition_to(&Status::Thinking));
        assert!(!Status::Error.can_transition_to(&Status::Listening));
        assert!(!Status::Idle.can_transition_to(&Status::Idle));
    }

    #[test]
    fn test_error_reachable_from_everywhere_but_itself() {
        for from in [Status::Idle, Status::Listening, Status::Thinking, Status::Speaking] {
            assert!(from.can_transition_to(&Status::Error), "{} -> Error", from);
        }
        assert!(!Status::Error.can_transition_to(&Status::Error));
        assert!(Status::Error.can_transition_to(&Status::Idle));
    }

    #[test]
    fn test_machine_rejects_invalid_transition() {
        let machine = StatusMachine::new();
        assert!(machine.transition(Status::Speaking).is_err());
        assert_eq!(machine.current(), Status::Idle);
    }

    #[test]
    fn test_machine_reset_recovers_from_error() {
        let machine = StatusMachine::new();
        machine.transition(Status::Thinking).unwrap();
        machine.transition(Status::Error).unwrap();
        machine.reset();
        assert_eq!(machine.current(), Status::Idle);
    }

    #[test]
    fn test_machine_clone_is_shared() {
        let a = StatusMachine::new();
        let b = a.clone();
        a.transition(Status::Listening).unwrap();
        assert_eq!(b.current(), Status::Listening);
    }
}

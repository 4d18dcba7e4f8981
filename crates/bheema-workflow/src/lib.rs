//! Declarative workflow execution for the Bheema assistant.
//!
//! The AI planner produces a [`WorkflowDefinition`], an ordered tree of
//! [`WorkflowStep`]s, and the [`Interpreter`] walks it, publishing
//! UI-binding and conversation events on the bus, suspending at user-input
//! steps and resuming when the controller delivers an answer.

pub mod error;
pub mod expr;
pub mod interpreter;
pub mod step;

pub use error::WorkflowError;
pub use interpreter::Interpreter;
pub use step::{WorkflowDefinition, WorkflowStep};

//! Conversation control for the Bheema assistant.
//!
//! The [`Controller`] is the hub between user input, the AI planner, the
//! workflow interpreter, and the speech queue. It owns the conversation
//! transcript, the [`Status`] state machine driving the listening and
//! speaking lifecycle, and the remote session handshake.

pub mod controller;
pub mod error;
pub mod planner;
pub mod shortcuts;
pub mod status;

pub use controller::{Controller, Directive};
pub use error::SessionError;
pub use planner::{Attachment, Planner, TaskReply};
pub use status::{Status, StatusMachine};

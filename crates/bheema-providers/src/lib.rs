//! Production backends for the Bheema assistant.
//!
//! HTTP implementations of the planner and synthesizer contracts against
//! the agent backend, a process-based audio player, and a logging fallback
//! speaker for machines with no local speech engine.

pub mod http;
pub mod planner;
pub mod playback;
pub mod synthesizer;

pub use http::build_client;
pub use planner::HttpPlanner;
pub use playback::{ProcessPlayback, StubSpeaker};
pub use synthesizer::HttpSynthesizer;

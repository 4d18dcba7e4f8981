//! Shared domain types used across the assistant crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unix epoch seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

/// Who authored a conversation message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One entry in the conversation log.
///
/// The log is append-only and owned by the conversation controller, which
/// de-duplicates entries by `id` before appending (the interpreter both
/// returns messages and publishes them on the bus, so the same message can
/// reach the controller twice).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub content: String,
    pub sender: Sender,
    pub timestamp: Timestamp,
    /// Whether this turn originated from voice capture.
    #[serde(default)]
    pub is_voice: bool,
    /// Recognition or intent confidence, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Follow-up suggestions to surface alongside the message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// BCP-47-ish language code the message is written in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
}

impl ConversationMessage {
    /// Create a bot-authored message.
    pub fn bot(content: impl Into<String>, language: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender: Sender::Bot,
            timestamp: Timestamp::now(),
            is_voice: false,
            confidence: None,
            suggestions: Vec::new(),
            detected_language: language.map(|l| l.to_string()),
        }
    }

    /// Create a user-authored message.
    pub fn user(content: impl Into<String>, is_voice: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender: Sender::User,
            timestamp: Timestamp::now(),
            is_voice,
            confidence: None,
            suggestions: Vec::new(),
            detected_language: None,
        }
    }

    /// Attach follow-up suggestions.
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

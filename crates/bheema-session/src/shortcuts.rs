//! Local shortcut classifier for common farming questions.
//!
//! A small set of requests is answered instantly from canned knowledge
//! instead of a planner round trip. This keeps greetings and the most
//! frequent queries working even before the remote session handshake has
//! finished.

use regex::Regex;
use std::sync::LazyLock;

/// A canned reply matched locally.
#[derive(Clone, Debug, PartialEq)]
pub struct ShortcutReply {
    pub text: String,
    pub suggestions: Vec<String>,
}

struct ShortcutPatterns {
    greeting: Vec<Regex>,
    joke: Regex,
    weather: Regex,
    disease: Regex,
    market: Regex,
    crop: Regex,
    schemes: Regex,
    help: Regex,
}

static PATTERNS: LazyLock<ShortcutPatterns> = LazyLock::new(|| ShortcutPatterns {
    // Bare greetings only; "hi, book a soil test" must reach the planner.
    greeting: vec![
        Regex::new(r"(?i)^hi$").expect("Invalid shortcut regex"),
        Regex::new(r"(?i)^hello$").expect("Invalid shortcut regex"),
        Regex::new(r"(?i)^hey$").expect("Invalid shortcut regex"),
        Regex::new(r"(?i)^namaste$").expect("Invalid shortcut regex"),
        Regex::new(r"(?i)^good\s+(morning|afternoon|evening)$").expect("Invalid shortcut regex"),
    ],
    joke: Regex::new(r"(?i)\bjoke\b").expect("Invalid shortcut regex"),
    weather: Regex::new(r"(?i)\b(weather|temperature|rain|forecast)\b").expect("Invalid shortcut regex"),
    disease: Regex::new(r"(?i)\b(disease|pest|infection|blight)\b").expect("Invalid shortcut regex"),
    market: Regex::new(r"(?i)\b(market|prices?|sell|mandi)\b").expect("Invalid shortcut regex"),
    crop: Regex::new(r"(?i)\b(crop|monitor|soil|irrigation)\b").expect("Invalid shortcut regex"),
    schemes: Regex::new(r"(?i)\b(schemes?|subsidy|government|yojana)\b").expect("Invalid shortcut regex"),
    help: Regex::new(r"(?i)\b(help|assist)\b").expect("Invalid shortcut regex"),
});

/// Classify a message against the shortcut patterns.
///
/// Returns `None` when the message needs the planner. Matching is checked
/// in a fixed priority order, so "help me with weather" answers as weather.
pub fn classify(message: &str) -> Option<ShortcutReply> {
    let message = message.trim();
    if message.is_empty() {
        return None;
    }

    let p = &*PATTERNS;
    if p.greeting.iter().any(|r| r.is_match(message)) {
        return Some(ShortcutReply {
            text: "Hello! I'm your farming assistant. I can help you with crop monitoring, \
                   disease identification, market prices, and weather forecasts. How can I \
                   assist you today?"
                .to_string(),
            suggestions: vec![
                "Check weather".to_string(),
                "Market prices".to_string(),
                "Government schemes".to_string(),
            ],
        });
    }
    if p.joke.is_match(message) {
        return Some(ShortcutReply {
            text: "Why did the scarecrow win an award? Because he was outstanding in his field!"
                .to_string(),
            suggestions: Vec::new(),
        });
    }
    if p.weather.is_match(message) {
        return Some(ShortcutReply {
            text: "Based on current data, expect partly cloudy weather with 25°C temperature. \
                   Humidity at 65% is ideal for plant growth."
                .to_string(),
            suggestions: vec!["Open weather page".to_string()],
        });
    }
    if p.disease.is_match(message) {
        return Some(ShortcutReply {
            text: "For disease detection, please upload a clear image of the affected plant. \
                   I can identify common diseases like blight, rust, and fungal infections."
                .to_string(),
            suggestions: vec!["Upload plant photo".to_string()],
        });
    }
    if p.market.is_match(message) {
        return Some(ShortcutReply {
            text: "Current market prices: Tomato ₹45/kg (+12%), Onion ₹32/kg (-8%), \
                   Rice ₹52/kg (stable)."
                .to_string(),
            suggestions: vec!["Open market trends".to_string()],
        });
    }
    if p.crop.is_match(message) {
        return Some(ShortcutReply {
            text: "Your crop monitoring shows good health overall. Soil moisture is in the \
                   optimal range. Consider light irrigation in the next 24 hours."
                .to_string(),
            suggestions: vec!["Open crop monitor".to_string()],
        });
    }
    if p.schemes.is_match(message) {
        return Some(ShortcutReply {
            text: "You may be eligible for schemes like PM-KISAN income support and the \
                   crop insurance scheme. Open the schemes page to check eligibility and apply."
                .to_string(),
            suggestions: vec!["Open government schemes".to_string()],
        });
    }
    if p.help.is_match(message) {
        return Some(ShortcutReply {
            text: "I can assist with crop monitoring, disease identification, market prices, \
                   weather forecasts, government schemes, and farming tips."
                .to_string(),
            suggestions: vec![
                "Check weather".to_string(),
                "Market prices".to_string(),
            ],
        });
    }
    None
}

// =============================================================================
// Tests
// =============================================================================

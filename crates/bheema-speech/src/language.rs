//! Language code to BCP 47 speech tag mapping.

/// Map a two-letter assistant language code to the regional tag speech
/// backends expect. Unknown codes get an upper-cased region guess so the
/// backend can still attempt a match.
pub fn language_tag(code: &str) -> String {
    match code {
        "en" => "en-US".to_string(),
        "hi" => "hi-IN".to_string(),
        "te" => "te-IN".to_string(),
        "ta" => "ta-IN".to_string(),
        "kn" => "kn-IN".to_string(),
        "mr" => "mr-IN".to_string(),
        "ml" => "ml-IN".to_string(),
        "bn" => "bn-IN".to_string(),
        "gu" => "gu-IN".to_string(),
        "pa" => "pa-IN".to_string(),
        "ur" => "ur-PK".to_string(),
        other => format!("{}-{}", other, other.to_uppercase()),
    }
}

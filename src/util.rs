//! Small text helpers shared by the client and the CLI.

use serde_json::Value;

/// Suffix appended to anything cut by [`truncate_preview`].
pub const TRUNCATION_SUFFIX: &str = "... (truncated)";

/// Keep at most `max_chars` characters, appending [`TRUNCATION_SUFFIX`] when cut.
pub fn truncate_preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((end, _)) => format!("{}{}", &s[..end], TRUNCATION_SUFFIX),
    }
}

/// Render a response body for humans: strings verbatim, everything else as
/// pretty JSON (a missing body renders as `{}`).
pub fn body_preview(body: &Value, max_chars: usize) -> String {
    let rendered = match body {
        Value::String(s) => s.clone(),
        Value::Null => "{}".to_string(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    truncate_preview(&rendered, max_chars)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate_preview("forbidden", 1500), "forbidden");
        assert_eq!(truncate_preview("", 3), "");
    }

    #[test]
    fn test_cut_counts_characters_not_bytes() {
        assert_eq!(truncate_preview("ação!", 3), "açã... (truncated)");
        assert_eq!(truncate_preview("abc", 3), "abc");
    }

    #[test]
    fn test_body_preview_shapes() {
        assert_eq!(body_preview(&json!("oops"), 10), "oops");
        assert_eq!(body_preview(&Value::Null, 10), "{}");
        assert_eq!(
            body_preview(&json!({"message": "forbidden"}), 1500),
            "{\n  \"message\": \"forbidden\"\n}"
        );
    }

    #[test]
    fn test_body_preview_is_bounded() {
        let long = "x".repeat(2000);
        let preview = body_preview(&json!(long), 1500);
        assert_eq!(preview.chars().count(), 1500 + TRUNCATION_SUFFIX.len());
    }
}

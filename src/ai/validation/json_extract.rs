//! JSON Extraction
//!
//! Models asked for a JSON object sometimes wrap it in commentary or a
//! markdown fence. Recovery is deliberately narrow: take everything from the
//! first `{` to the last `}` and parse that. No structural repair.

use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::display;
use crate::types::{ForgeError, Result};

/// Parse a JSON object from model output, tolerating surrounding prose.
pub fn extract_json_object(content: &str) -> Result<Value> {
    let trimmed = content.trim().trim_start_matches('\u{feff}');

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    debug!("Content is not a clean JSON object, extracting braces");

    let extracted = brace_span(trimmed).ok_or_else(|| {
        ForgeError::Parse(format!(
            "No JSON object found in response. Content preview: {}",
            excerpt(trimmed, display::BODY_EXCERPT_CHARS)
        ))
    })?;

    match serde_json::from_str::<Value>(extracted) {
        Ok(value @ Value::Object(_)) => {
            warn!("JSON object extracted from surrounding text");
            Ok(value)
        }
        Ok(_) => Err(ForgeError::Parse("Extracted JSON is not an object".to_string())),
        Err(e) => Err(ForgeError::Parse(format!(
            "Invalid JSON in response: {}. Content preview: {}",
            e,
            excerpt(extracted, display::BODY_EXCERPT_CHARS)
        ))),
    }
}

/// Slice between the first `{` and the last `}` inclusive
fn brace_span(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    (end > start).then(|| &s[start..=end])
}

/// Remove a leading ```lang line and a trailing ``` marker
pub fn strip_code_fences(s: &str) -> String {
    let mut result = s.trim();

    if result.starts_with("```") {
        result = match result.find('\n') {
            Some(first_newline) => &result[first_newline + 1..],
            None => result.trim_start_matches('`'),
        };
    }

    if let Some(stripped) = result.trim_end().strip_suffix("```") {
        result = stripped;
    }

    result.trim().to_string()
}

/// First `max_chars` characters, never splitting a code point
pub fn excerpt(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_object() {
        let value = extract_json_object(r#"{"content_html": "<p>Hi</p>"}"#).unwrap();
        assert_eq!(value["content_html"], "<p>Hi</p>");
    }

    #[test]
    fn test_object_wrapped_in_prose() {
        let input = "Here is your article:\n{\"content_html\": \"<p>x</p>\", \"tags\": []}\nEnjoy!";
        let value = extract_json_object(input).unwrap();
        assert_eq!(value["content_html"], "<p>x</p>");
    }

    #[test]
    fn test_fenced_object() {
        let input = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json_object(input).unwrap()["a"], 1);
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = extract_json_object("I cannot help with that.").unwrap_err();
        assert!(matches!(err, ForgeError::Parse(_)));

        let err = extract_json_object("} backwards {").unwrap_err();
        assert!(matches!(err, ForgeError::Parse(_)));
    }

    #[test]
    fn test_array_is_not_an_object() {
        assert!(extract_json_object("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```html\n<p>a</p>\n```"), "<p>a</p>");
        assert_eq!(strip_code_fences("<p>a</p>"), "<p>a</p>");
        assert_eq!(strip_code_fences("  <p>a</p>\n```  "), "<p>a</p>");
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("Grüße aus Köln", 5), "Grüße...");
        assert_eq!(excerpt("kurz", 10), "kurz");
    }
}

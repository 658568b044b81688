//! Generated post payload validation
//!
//! The initial generation must return `content_html`; `category_name` and
//! `tags` are optional and parsed leniently.

use serde_json::Value;

use crate::types::{ForgeError, Result};

/// Typed view of the initial generation payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPost {
    pub content_html: String,
    pub category_name: String,
    pub tags: Vec<String>,
}

impl GeneratedPost {
    /// Validate the parsed JSON object at the provider boundary
    pub fn from_value(value: &Value) -> Result<Self> {
        let content_html = value
            .get("content_html")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ForgeError::Parse("Response is missing a non-empty \"content_html\"".to_string())
            })?
            .to_string();

        let category_name = value
            .get("category_name")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let tags = value
            .get("tags")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            content_html,
            category_name,
            tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_payload() {
        let post = GeneratedPost::from_value(&json!({
            "content_html": "<h2>Intro</h2><p>Text</p>",
            "category_name": " Energy ",
            "tags": ["solar", "", 42, "roof"]
        }))
        .unwrap();

        assert_eq!(post.category_name, "Energy");
        assert_eq!(post.tags, vec!["solar", "roof"]);
    }

    #[test]
    fn test_missing_content_is_parse_error() {
        let err = GeneratedPost::from_value(&json!({"category_name": "x"})).unwrap_err();
        assert!(matches!(err, ForgeError::Parse(_)));

        let err = GeneratedPost::from_value(&json!({"content_html": "   "})).unwrap_err();
        assert!(matches!(err, ForgeError::Parse(_)));

        let err = GeneratedPost::from_value(&json!({"content_html": ["<p>"]})).unwrap_err();
        assert!(matches!(err, ForgeError::Parse(_)));
    }

    #[test]
    fn test_optional_fields_default() {
        let post = GeneratedPost::from_value(&json!({"content_html": "<p>x</p>"})).unwrap();
        assert!(post.category_name.is_empty());
        assert!(post.tags.is_empty());
    }
}

//! Placeholder rendering
//!
//! Prompt bodies use `{name}` placeholders from a fixed set. Rendering
//! rejects names outside the set and known names with no value, so a typo
//! in a stored prompt never reaches the model verbatim. Literal JSON in a
//! prompt (`{"content_html": ...}`) is not a placeholder and passes through.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::types::{ForgeError, Result};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z][a-z0-9_]*)\}").expect("placeholder regex"));

/// The closed set of template variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placeholder {
    PostTitle,
    PostExcerpt,
    PostContent,
    MinWords,
    MaxWords,
    CurrentWords,
    TargetWords,
    WordDelta,
    Length,
    EditorialLine,
    AuthorStyle,
    TargetAudience,
}

impl Placeholder {
    pub const ALL: [Placeholder; 12] = [
        Placeholder::PostTitle,
        Placeholder::PostExcerpt,
        Placeholder::PostContent,
        Placeholder::MinWords,
        Placeholder::MaxWords,
        Placeholder::CurrentWords,
        Placeholder::TargetWords,
        Placeholder::WordDelta,
        Placeholder::Length,
        Placeholder::EditorialLine,
        Placeholder::AuthorStyle,
        Placeholder::TargetAudience,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Placeholder::PostTitle => "post_title",
            Placeholder::PostExcerpt => "post_excerpt",
            Placeholder::PostContent => "post_content",
            Placeholder::MinWords => "min_words",
            Placeholder::MaxWords => "max_words",
            Placeholder::CurrentWords => "current_words",
            Placeholder::TargetWords => "target_words",
            Placeholder::WordDelta => "word_delta",
            Placeholder::Length => "length",
            Placeholder::EditorialLine => "editorial_line",
            Placeholder::AuthorStyle => "author_style",
            Placeholder::TargetAudience => "target_audience",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name())
    }
}

impl FromStr for Placeholder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Placeholder::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("Unknown placeholder: {{{}}}", s))
    }
}

/// Values for one render call
#[derive(Debug, Clone, Default)]
pub struct PromptVars {
    values: BTreeMap<Placeholder, String>,
}

impl PromptVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, placeholder: Placeholder, value: impl ToString) -> Self {
        self.values.insert(placeholder, value.to_string());
        self
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.values.get(&placeholder).map(String::as_str)
    }
}

/// Substitute every placeholder in `text`.
pub fn render(text: &str, vars: &PromptVars) -> Result<String> {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let placeholder: Placeholder = name.as_str().parse().map_err(ForgeError::Template)?;
        let value = vars.get(placeholder).ok_or_else(|| {
            ForgeError::Template(format!("No value supplied for placeholder {}", placeholder))
        })?;

        output.push_str(&text[last..whole.start()]);
        output.push_str(value);
        last = whole.end();
    }

    output.push_str(&text[last..]);
    Ok(output)
}

/// Placeholder-looking names in `text` that are outside the closed set
pub fn unknown_placeholders(text: &str) -> Vec<String> {
    PLACEHOLDER_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| name.parse::<Placeholder>().is_err())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_all() {
        let vars = PromptVars::new()
            .set(Placeholder::PostTitle, "Heat pumps")
            .set(Placeholder::MinWords, 300)
            .set(Placeholder::MaxWords, 500);

        let out = render("Write about {post_title} in {min_words}-{max_words} words.", &vars).unwrap();
        assert_eq!(out, "Write about Heat pumps in 300-500 words.");
    }

    #[test]
    fn test_literal_json_untouched() {
        let vars = PromptVars::new().set(Placeholder::PostTitle, "X");
        let text = "Topic: {post_title}\n{\n  \"content_html\": \"HTML\",\n  \"tags\": [\"a\"]\n}";
        let out = render(text, &vars).unwrap();
        assert!(out.contains("\"content_html\": \"HTML\""));
        assert!(out.starts_with("Topic: X"));
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = render("Hello {post_author}", &PromptVars::new()).unwrap_err();
        assert!(matches!(err, ForgeError::Template(_)));
        assert!(err.to_string().contains("post_author"));
    }

    #[test]
    fn test_missing_value_rejected() {
        let err = render("Hello {post_title}", &PromptVars::new()).unwrap_err();
        assert!(matches!(err, ForgeError::Template(_)));
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let vars = PromptVars::new().set(Placeholder::PostContent, "<p>{min_words}</p>");
        assert_eq!(render("{post_content}", &vars).unwrap(), "<p>{min_words}</p>");
    }

    #[test]
    fn test_unknown_placeholders_listing() {
        let names = unknown_placeholders("{post_title} {foo} {\"a\": 1} {bar_baz}");
        assert_eq!(names, vec!["foo", "bar_baz"]);
    }

    #[test]
    fn test_utf8_text_kept_verbatim() {
        let vars = PromptVars::new().set(Placeholder::PostTitle, "Wärmepumpen für Einsteiger");
        let out = render("Schreibe über {post_title} – jetzt.", &vars).unwrap();
        assert_eq!(out, "Schreibe über Wärmepumpen für Einsteiger – jetzt.");
    }
}

//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Categories
//!
//! - **Configuration**: Missing credentials or prompts (fatal, operator action)
//! - **Transport**: Network failures talking to the provider
//! - **Timeout**: Provider call exceeded its deadline (recoverable)
//! - **Api**: Provider returned a structured error payload
//! - **Parse**: Response did not have the expected shape
//! - **Storage**: Local persistence failures
//!
//! A word count outside the target band is not an error. It is reported in
//! the generation result instead.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories for routing decisions in callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing API key, missing prompt, invalid settings - fail fast
    Configuration,
    /// Network/connectivity issues - caller may retry
    Transport,
    /// Deadline exceeded - caller may retry
    Timeout,
    /// Provider rejected the request - surface the provider's message
    Api,
    /// Response shape was not what we asked for
    Parse,
    /// Local database or file system
    Storage,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Transport => write!(f, "TRANSPORT"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Api => write!(f, "API"),
            Self::Parse => write!(f, "PARSE"),
            Self::Storage => write!(f, "STORAGE"),
        }
    }
}

impl ErrorCategory {
    /// Whether a caller-side retry could plausibly succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport | Self::Timeout)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ForgeError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    /// Required prompt is absent or inactive. Never falls back to a built-in text.
    #[error(
        "Prompt \"{slug}\"{} not found or inactive. Add it with 'postforge prompts seed' or 'postforge prompts import'",
        variant_suffix(.variant)
    )]
    PromptNotFound {
        slug: String,
        variant: Option<String>,
    },

    #[error("Template error: {0}")]
    Template(String),

    // -------------------------------------------------------------------------
    // Provider Errors
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("OpenAI API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, ForgeError>;

fn variant_suffix(variant: &Option<String>) -> String {
    variant
        .as_ref()
        .map(|v| format!(" (variant \"{}\")", v))
        .unwrap_or_default()
}

// =============================================================================
// Helper Functions
// =============================================================================

impl ForgeError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a prompt-not-found error
    pub fn prompt_not_found(slug: impl Into<String>, variant: Option<&str>) -> Self {
        Self::PromptNotFound {
            slug: slug.into(),
            variant: variant.map(str::to_string),
        }
    }

    /// Create an API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::PromptNotFound { .. } | Self::Template(_) => {
                ErrorCategory::Configuration
            }
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Api { .. } => ErrorCategory::Api,
            Self::Parse(_) | Self::Json(_) | Self::Yaml(_) => ErrorCategory::Parse,
            Self::Io(_) | Self::Database(_) | Self::Storage(_) => ErrorCategory::Storage,
        }
    }

    /// Check if this error is recoverable (can be retried by the caller)
    pub fn is_recoverable(&self) -> bool {
        self.category().is_recoverable()
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| ForgeError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| ForgeError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Configuration.to_string(), "CONFIGURATION");
        assert_eq!(ErrorCategory::Timeout.to_string(), "TIMEOUT");
        assert_eq!(ErrorCategory::Api.to_string(), "API");
    }

    #[test]
    fn test_provider_errors_are_distinguishable() {
        let transport = ForgeError::Transport("connection refused".to_string());
        let api = ForgeError::api(401, "Incorrect API key provided");
        let parse = ForgeError::Parse("no JSON object".to_string());
        let timeout = ForgeError::timeout("chat completion", Duration::from_secs(180));

        assert_eq!(transport.category(), ErrorCategory::Transport);
        assert_eq!(api.category(), ErrorCategory::Api);
        assert_eq!(parse.category(), ErrorCategory::Parse);
        assert_eq!(timeout.category(), ErrorCategory::Timeout);
    }

    #[test]
    fn test_recoverable() {
        assert!(ForgeError::Transport("reset".to_string()).is_recoverable());
        assert!(ForgeError::timeout("x", Duration::from_secs(1)).is_recoverable());
        assert!(!ForgeError::api(500, "server error").is_recoverable());
        assert!(!ForgeError::Config("no key".to_string()).is_recoverable());
        assert!(!ForgeError::prompt_not_found("post-generation", None).is_recoverable());
    }

    #[test]
    fn test_prompt_not_found_display() {
        let err = ForgeError::prompt_not_found("post-generation", Some("long"));
        let msg = err.to_string();
        assert!(msg.contains("\"post-generation\""));
        assert!(msg.contains("variant \"long\""));

        let err = ForgeError::prompt_not_found("system-correction", None);
        assert!(!err.to_string().contains("variant"));
    }

    #[test]
    fn test_api_error_display() {
        let err = ForgeError::api(429, "Rate limit reached");
        assert_eq!(err.to_string(), "OpenAI API error (429): Rate limit reached");
    }
}

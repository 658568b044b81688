//! Completion Provider Abstraction
//!
//! Defines the `CompletionClient` trait the generation pipeline talks to.
//! One call sends a system and a user message with explicit model
//! parameters and returns the parsed content plus everything the debug
//! trail needs (status, raw body, usage, model actually used).
//!
//! Failures stay distinguishable: `Transport`/`Timeout` for the network,
//! `Api` for a provider error payload, `Parse` for content that does not
//! match the requested format.

mod openai;

pub use openai::{GeneratedImage, ImageClient, OpenAiClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::constants::models;
use crate::types::Result;

// =============================================================================
// Request
// =============================================================================

/// Output format requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    JsonObject,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Text => "text",
            ResponseFormat::JsonObject => "json_object",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(ResponseFormat::Text),
            "json_object" | "json" => Ok(ResponseFormat::JsonObject),
            _ => Err(format!("Unknown response format: {}", s)),
        }
    }
}

/// One chat completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    /// Configured temperature. Not sent for reasoning models.
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

impl CompletionRequest {
    /// Whether the temperature parameter goes on the wire
    pub fn sends_temperature(&self) -> bool {
        !is_reasoning_model(&self.model)
    }

    /// Temperature as it should appear in debug output
    pub fn display_temperature(&self) -> String {
        display_temperature(&self.model, self.temperature)
    }
}

/// Models that reject any temperature other than the provider default
pub fn is_reasoning_model(model: &str) -> bool {
    let model = model.trim().to_lowercase();
    models::REASONING_MODEL_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

/// "1 (default)" for reasoning models, the configured value otherwise
pub fn display_temperature(model: &str, temperature: f32) -> String {
    if is_reasoning_model(model) {
        models::DEFAULT_TEMPERATURE_LABEL.to_string()
    } else {
        temperature.to_string()
    }
}

// =============================================================================
// Response
// =============================================================================

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Parsed message content, shaped by the requested format
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionContent {
    Text(String),
    Json(Value),
}

impl CompletionContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CompletionContent::Text(text) => Some(text),
            CompletionContent::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            CompletionContent::Json(value) => Some(value),
            CompletionContent::Text(_) => None,
        }
    }
}

/// Successful completion with debug metadata
#[derive(Debug, Clone)]
pub struct Completion {
    pub status: u16,
    pub raw_body: String,
    pub content: CompletionContent,
    pub usage: TokenUsage,
    pub model_used: String,
}

// =============================================================================
// Client Trait
// =============================================================================

/// Chat completion client
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one completion request and parse the reply per `response_format`
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;

    /// Client name for logging
    fn name(&self) -> &str;
}

/// Shared client handle; runs share nothing else
pub type SharedClient = Arc<dyn CompletionClient>;

//! OpenAI API Client
//!
//! Chat completions for post generation and corrections, plus the images
//! endpoint for featured images. The raw body and HTTP status of every
//! completion are kept for the debug trail.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{Completion, CompletionClient, CompletionContent, CompletionRequest, ResponseFormat, TokenUsage};
use crate::ai::validation::{excerpt, extract_json_object};
use crate::config::OpenAiConfig;
use crate::constants::{display, image, network};
use crate::types::{ForgeError, Result};

/// OpenAI client with secure API key handling
pub struct OpenAiClient {
    /// Never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    image_model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("image_model", &self.image_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(api_key: SecretString, api_base: &str, timeout: Duration) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ForgeError::Config("OpenAI API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(network::CONNECTION_TIMEOUT_SECS))
            .build()
            .map_err(|e| ForgeError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            image_model: image::DEFAULT_MODEL.to_string(),
            timeout,
            client,
        })
    }

    /// Build from the `[openai]` config section
    pub fn from_config(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            ForgeError::Config(
                "OpenAI API key not found. Set OPENAI_API_KEY or openai.api_key in config"
                    .to_string(),
            )
        })?;

        Ok(Self::new(
            api_key,
            &config.api_base,
            Duration::from_secs(config.timeout_secs),
        )?
        .with_image_model(&config.image_model))
    }

    pub fn with_image_model(mut self, model: &str) -> Self {
        self.image_model = model.to_string();
        self
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_prompt.clone(),
                },
            ],
            temperature: request.sends_temperature().then_some(request.temperature),
            max_completion_tokens: request.max_tokens,
            response_format: match request.response_format {
                ResponseFormat::JsonObject => Some(WireResponseFormat {
                    format_type: "json_object".to_string(),
                }),
                ResponseFormat::Text => None,
            },
        }
    }

    /// POST a JSON body and return status plus raw text
    async fn post_json<B: Serialize>(&self, endpoint: &str, body: &B, operation: &str) -> Result<(u16, String)> {
        let url = format!("{}/{}", self.api_base, endpoint);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, operation))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_send_error(e, operation))?;

        Ok((status, text))
    }

    fn map_send_error(&self, e: reqwest::Error, operation: &str) -> ForgeError {
        if e.is_timeout() {
            ForgeError::timeout(operation, self.timeout)
        } else {
            ForgeError::Transport(format!("OpenAI request failed: {}", e))
        }
    }
}

/// Turn a raw HTTP reply into a JSON value, surfacing provider errors.
///
/// An `error` object wins over the status code; the provider sometimes
/// reports failures with 200.
fn parse_body(status: u16, body: &str) -> Result<Value> {
    let parsed = serde_json::from_str::<Value>(body);

    if let Ok(value) = &parsed
        && let Some(error) = value.get("error").filter(|e| e.is_object())
    {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        return Err(ForgeError::api(status, message));
    }

    if !(200..300).contains(&status) {
        return Err(ForgeError::api(
            status,
            excerpt(body.trim(), display::BODY_EXCERPT_CHARS),
        ));
    }

    parsed.map_err(|e| {
        ForgeError::Parse(format!(
            "Provider returned non-JSON body: {}. Body: {}",
            e,
            excerpt(body, display::BODY_EXCERPT_CHARS)
        ))
    })
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        info!(
            "Requesting completion (model: {}, max tokens: {}, format: {}, temperature: {})",
            request.model,
            request.max_tokens,
            request.response_format,
            request.display_temperature()
        );

        let start_time = Instant::now();
        let body = self.build_request(request);
        let (status, raw_body) = self
            .post_json("chat/completions", &body, "chat completion")
            .await?;

        debug!(
            "OpenAI responded with {} in {}ms",
            status,
            start_time.elapsed().as_millis()
        );

        let value = parse_body(status, &raw_body)?;
        let response: ChatCompletionResponse = serde_json::from_value(value).map_err(|e| {
            ForgeError::Parse(format!("Unexpected completion response shape: {}", e))
        })?;

        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens.unwrap_or(u.prompt_tokens + u.completion_tokens),
            })
            .unwrap_or_default();

        let message = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ForgeError::Parse("No content in OpenAI response".to_string()))?;

        let content = match request.response_format {
            ResponseFormat::JsonObject => CompletionContent::Json(extract_json_object(&message)?),
            ResponseFormat::Text => CompletionContent::Text(message),
        };

        let model_used = response.model.unwrap_or_else(|| request.model.clone());

        info!(
            "Completion received (model: {}, tokens: {} in / {} out)",
            model_used, usage.prompt_tokens, usage.completion_tokens
        );

        Ok(Completion {
            status,
            raw_body,
            content,
            usage,
            model_used,
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// =============================================================================
// Images
// =============================================================================

/// One generated image; the provider returns a URL, base64 data, or both
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedImage {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub b64_json: Option<String>,
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

/// Featured image generation
#[async_trait]
pub trait ImageClient: Send + Sync {
    /// Generate `n` images (clamped to 1..=4) for a prompt
    async fn generate_images(&self, prompt: &str, n: u8, size: &str) -> Result<Vec<GeneratedImage>>;
}

#[async_trait]
impl ImageClient for OpenAiClient {
    async fn generate_images(&self, prompt: &str, n: u8, size: &str) -> Result<Vec<GeneratedImage>> {
        let n = n.clamp(1, image::MAX_IMAGES);
        if prompt.trim().is_empty() {
            return Err(ForgeError::Config("Image prompt is empty".to_string()));
        }

        info!(
            "Requesting {} image(s) (model: {}, size: {})",
            n, self.image_model, size
        );

        let body = ImageGenerationRequest {
            model: self.image_model.clone(),
            prompt: prompt.to_string(),
            n,
            size: size.to_string(),
        };

        let (status, raw_body) = self
            .post_json("images/generations", &body, "image generation")
            .await?;
        let value = parse_body(status, &raw_body)?;

        let response: ImageGenerationResponse = serde_json::from_value(value)
            .map_err(|e| ForgeError::Parse(format!("Unexpected image response shape: {}", e)))?;

        let images: Vec<GeneratedImage> = response
            .data
            .into_iter()
            .filter(|img| img.url.is_some() || img.b64_json.is_some())
            .collect();

        if images.is_empty() {
            warn!("Image endpoint returned no usable images");
            return Err(ForgeError::Parse("No image returned".to_string()));
        }

        Ok(images)
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<WireResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct WireResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    total_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest {
    model: String,
    prompt: String,
    n: u8,
    size: String,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

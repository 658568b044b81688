//! AI Integration Layer
//!
//! OpenAI chat and image clients, prompt storage and rendering, response
//! validation, call deadlines, and pre-flight checks.

pub mod preflight;
pub mod prompt;
pub mod provider;
pub mod timeout;
pub mod validation;

pub use preflight::{CheckResult, PreflightCheck, PreflightResult};
pub use prompt::{
    MemoryPromptStore, ModelConfig, ModelSettings, PromptStore, PromptTemplate, PromptType,
    SharedPromptStore,
};
pub use provider::{
    Completion, CompletionClient, CompletionContent, CompletionRequest, GeneratedImage,
    ImageClient, OpenAiClient, ResponseFormat, SharedClient, TokenUsage,
};
pub use timeout::with_timeout;
pub use validation::GeneratedPost;

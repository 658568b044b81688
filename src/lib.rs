//! postforge - Blog Post Generation with Length Correction
//!
//! Generates a blog post from a title through an LLM, measures the visible
//! word count of the returned HTML, and asks the model to expand or shorten
//! the post until it lands inside the requested length band.
//!
//! ## Core Features
//!
//! - **Prompt Store**: Templates with per-length variants and model settings,
//!   backed by SQLite (with a TTL cache) or a YAML file
//! - **Length Validation**: Word counting over rendered text with a ±10% band
//! - **Correction Loop**: Bounded expand/shorten attempts with a full debug trail
//! - **Generation Log**: Persisted results for inspection and statistics
//!
//! ## Quick Start
//!
//! ```ignore
//! use postforge::{ConfigLoader, GenerateRequest, GenerationPipeline, LengthKey, PipelineConfig};
//!
//! let config = ConfigLoader::load()?;
//! let store = Arc::new(MemoryPromptStore::load("prompts.yaml")?);
//! let pipeline = GenerationPipeline::openai(PipelineConfig::from_config(&config), store)?;
//! let request = GenerateRequest {
//!     title: "Heat pumps in old houses".to_string(),
//!     excerpt_or_context: String::new(),
//!     length_key: LengthKey::Medium,
//!     auto_correct: true,
//!     max_corrections: 2,
//! };
//! let result = pipeline.run(&request).await?;
//! println!("{} words", result.word_count.final_count);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: Completion client, prompt store, response parsing
//! - [`content`]: Word counting and length validation
//! - [`pipeline`]: Generation state machine and correction engine
//! - [`storage`]: SQLite persistence with connection pooling
//! - [`config`]: Layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod content;
pub mod pipeline;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, ForgeError, Result, ResultExt};

// Domain
pub use types::{
    DebugTrail, Direction, GenerateRequest, GenerationResult, LengthKey, LengthRange, LengthTable,
    PostKey, StopReason,
};

// Storage
pub use storage::database::PoolConfig;
pub use storage::{Database, GenerationLog, SharedDatabase, SqlitePromptStore};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use content::{LengthCheck, count_words, validate_length};
pub use pipeline::{CorrectionEngine, GenerationPipeline, PipelineConfig};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    CompletionClient, MemoryPromptStore, OpenAiClient, PromptStore, PromptTemplate,
    SharedPromptStore, with_timeout,
};

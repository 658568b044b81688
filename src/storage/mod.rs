//! Local persistence: pooled SQLite, the prompt store, and the generation log.

pub mod database;
mod generation_log;
mod prompt_store;

pub use database::{Database, PoolConfig, SharedDatabase};
pub use generation_log::{
    GenerationLog, GenerationStats, GenerationStatus, GenerationSummary, StoredGeneration,
};
pub use prompt_store::SqlitePromptStore;

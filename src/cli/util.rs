//! CLI Common Utilities
//!
//! Shared initialization for CLI commands: configuration, the database, the
//! prompt store, and the generation log.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::ai::prompt::{MemoryPromptStore, SharedPromptStore};
use crate::config::{Config, ConfigLoader};
use crate::storage::{Database, GenerationLog, SharedDatabase, SqlitePromptStore};
use crate::types::Result;

/// Command execution context
#[derive(Clone)]
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
    /// Shared database handle
    pub db: SharedDatabase,
    /// Prompt store used for generation (YAML file or database)
    pub store: SharedPromptStore,
    /// Database prompt store; shares its cache with `store` when that is the database
    prompts_db: Arc<SqlitePromptStore>,
}

impl CommandContext {
    /// Load configuration (from `config_path` when given) and open storage
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let db_path = config.storage.database_path();
        debug!("Opening database: {}", db_path.display());
        let db: SharedDatabase = Arc::new(Database::open(&db_path)?);

        let prompts_db = Arc::new(SqlitePromptStore::new(
            db.clone(),
            Duration::from_secs(config.prompts.cache_ttl_secs),
        ));

        let store: SharedPromptStore = match &config.prompts.file {
            Some(file) => {
                debug!("Using prompt file: {}", file.display());
                Arc::new(MemoryPromptStore::load(file)?)
            }
            None => prompts_db.clone() as SharedPromptStore,
        };

        Ok(Self {
            config,
            db,
            store,
            prompts_db,
        })
    }

    /// The database-backed prompt store, regardless of `prompts.file`
    pub fn sqlite_store(&self) -> &SqlitePromptStore {
        &self.prompts_db
    }

    pub fn generation_log(&self) -> GenerationLog {
        GenerationLog::new(self.db.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt::{PromptStore, default_templates, export_yaml, seed_defaults};
    use crate::constants::prompts;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.storage.database = Some(dir.join("data").join("postforge.db"));
        config
    }

    #[test]
    fn test_context_uses_database_store() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CommandContext::from_config(config_in(dir.path())).unwrap();

        assert!(ctx.store.get_template(prompts::POST_GENERATION).unwrap().is_none());
        seed_defaults(ctx.sqlite_store()).unwrap();
        assert!(ctx.store.get_template(prompts::POST_GENERATION).unwrap().is_some());
    }

    #[test]
    fn test_context_prefers_prompt_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prompts.yaml");
        std::fs::write(&file, export_yaml(&default_templates()).unwrap()).unwrap();

        let mut config = config_in(dir.path());
        config.prompts.file = Some(file);
        let ctx = CommandContext::from_config(config).unwrap();

        assert!(ctx.store.get_template(prompts::POST_GENERATION).unwrap().is_some());
        assert!(ctx.sqlite_store().list_templates().unwrap().is_empty());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("explicit.db");
        let config_file = dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            format!("[storage]\ndatabase = {:?}\n", db.to_string_lossy()),
        )
        .unwrap();

        let ctx = CommandContext::load(Some(&config_file)).unwrap();
        assert_eq!(ctx.config.storage.database_path(), db);
        assert!(db.exists());
    }
}

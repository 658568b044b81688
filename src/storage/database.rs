//! Database Layer with Connection Pooling and Safe Transactions
//!
//! SQLite database layer featuring:
//! - Connection pooling via r2d2 for concurrent access
//! - Panic-safe transactions with automatic rollback
//! - Version-tracked migrations
//! - WAL mode for concurrent readers during a write

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::types::{ForgeError, Result, ResultExt};

/// Shared database handle for async contexts.
pub type SharedDatabase = Arc<Database>;

const SCHEMA: &str = include_str!("schema.sql");

/// Current schema version for migration tracking
const SCHEMA_VERSION: u32 = 2;

/// Migration definitions
struct Migration {
    version: u32,
    description: &'static str,
    up: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 2,
    description: "Index generations by creation time",
    up: "CREATE INDEX IF NOT EXISTS idx_generations_created ON generations(created_at)",
}];

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,
    /// Minimum idle connections to keep ready
    pub min_idle: u32,
    /// Timeout for acquiring a connection (seconds)
    pub connection_timeout_secs: u64,
}

impl PoolConfig {
    const MIN_POOL_SIZE: u32 = 2;
    const MAX_POOL_SIZE: u32 = 8;

    /// One connection per core, within bounds
    pub fn optimal_pool_size() -> u32 {
        let cores = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(2);

        cores.clamp(Self::MIN_POOL_SIZE, Self::MAX_POOL_SIZE)
    }

    pub fn auto() -> Self {
        Self {
            max_size: Self::optimal_pool_size(),
            min_idle: 1,
            connection_timeout_secs: crate::constants::network::CONNECTION_TIMEOUT_SECS,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::auto()
    }
}

/// Thread-safe database with connection pooling.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open database with connection pooling at the specified path.
    ///
    /// Creates the parent directory when missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, PoolConfig::default())
    }

    /// Open database with custom pool configuration.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: PoolConfig) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context_fn(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(Self::configure_connection);

        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(config.min_idle))
            .connection_timeout(std::time::Duration::from_secs(
                config.connection_timeout_secs,
            ))
            .build(manager)
            .map_err(|e| ForgeError::Storage(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.initialize()?;
        Ok(db)
    }

    /// Open an in-memory database for testing or temporary use.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();

        // Each in-memory connection is its own database; keep exactly one
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| ForgeError::Storage(format!("Failed to create in-memory pool: {}", e)))?;

        let db = Self { pool };
        db.initialize()?;
        Ok(db)
    }

    fn configure_connection(conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            "#,
        )?;
        Ok(())
    }

    /// Get a connection from the pool.
    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            ForgeError::Storage(format!("Failed to acquire database connection: {}", e))
        })
    }

    /// Create tables and apply pending migrations.
    fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;

        let current_version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);

        conn.execute_batch(SCHEMA)
            .with_context("Failed to initialize database schema")?;

        // Migration statements are idempotent, so fresh databases run them too
        for migration in MIGRATIONS {
            if migration.version > current_version {
                conn.execute_batch(migration.up).with_context_fn(|| {
                    format!(
                        "Failed to apply migration {}: {}",
                        migration.version, migration.description
                    )
                })?;

                tracing::debug!(
                    "Applied migration {}: {}",
                    migration.version,
                    migration.description
                );
            }
        }

        if current_version < SCHEMA_VERSION {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .with_context("Failed to update schema version")?;
        }

        Ok(())
    }

    /// Get a raw connection for advanced operations.
    pub fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.conn()
    }

    /// Execute a function within a panic-safe database transaction.
    ///
    /// All operations within the closure are atomic. If the closure panics,
    /// the transaction is rolled back and an error is returned instead of
    /// poisoning the connection pool.
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + std::panic::UnwindSafe,
    {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .with_context("Failed to start transaction")?;

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&tx)));

        match result {
            Ok(Ok(value)) => {
                tx.commit().with_context("Failed to commit transaction")?;
                Ok(value)
            }
            // Rolled back on drop
            Ok(Err(e)) => Err(e),
            Err(panic_payload) => {
                let panic_msg = panic_payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic_payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "Unknown panic".to_string());

                tracing::error!("Transaction panicked: {}", panic_msg);
                Err(ForgeError::Storage(format!(
                    "Transaction panicked: {}",
                    panic_msg
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(db: &Database) -> Vec<String> {
        let conn = db.connection().unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let tables = table_names(&db);

        assert!(tables.contains(&"prompts".to_string()));
        assert!(tables.contains(&"generations".to_string()));
    }

    #[test]
    fn test_open_file_creates_parent_and_sets_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("postforge.db");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());

        let version: u32 = db
            .connection()
            .unwrap()
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        // Reopening an initialized database is a no-op
        drop(db);
        assert!(Database::open(&path).is_ok());
    }

    #[test]
    fn test_migrates_older_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(SCHEMA).unwrap();
            conn.pragma_update(None, "user_version", 1).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let conn = db.connection().unwrap();
        let index_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name='idx_generations_created'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index_count, 1);
    }

    #[test]
    fn test_transaction_panic_safety() {
        let db = Database::open_in_memory().expect("Failed to open database");

        let result = db.transaction(|_conn| {
            panic!("Intentional panic for testing");
            #[allow(unreachable_code)]
            Ok(())
        });

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("panicked"));
        assert!(db.connection().is_ok());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();

        let result: Result<()> = db.transaction(|conn| {
            conn.execute(
                "INSERT INTO prompts (slug, title, prompt_type, updated_at) VALUES ('a', 'A', 'image', 'now')",
                [],
            )?;
            Err(ForgeError::Storage("abort".to_string()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .connection()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM prompts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_transaction_commits_on_success() {
        let db = Database::open_in_memory().unwrap();

        let affected = db
            .transaction(|conn| {
                conn.execute(
                    "INSERT INTO prompts (slug, title, prompt_type, updated_at) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params!["image-generation", "Image", "image", "2025-01-01T00:00:00Z"],
                )
                .with_context("insert")
            })
            .unwrap();
        assert_eq!(affected, 1);

        let count: i64 = db
            .connection()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM prompts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}

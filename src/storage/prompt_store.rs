//! SQLite-backed prompt store with a read-through TTL cache
//!
//! Lookups go through a `DashMap` keyed by slug. Entries hold the active
//! template (or its absence) together with the time they were loaded and
//! expire after the configured TTL. Writes through this store invalidate
//! the affected slug; edits made to the database by other processes
//! become visible once the entry expires or `clear_cache` runs.

use dashmap::DashMap;
use rusqlite::{OptionalExtension, Row, params};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;

use super::SharedDatabase;
use crate::ai::prompt::{ModelSettings, PromptStore, PromptTemplate, PromptType};
use crate::types::{ForgeError, Result, ResultExt};

#[derive(Clone)]
struct CacheEntry {
    loaded_at: Instant,
    template: Option<PromptTemplate>,
}

/// Raw column values of one `prompts` row
type PromptRow = (String, String, String, String, Option<String>, String, bool);

pub struct SqlitePromptStore {
    db: SharedDatabase,
    cache: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl SqlitePromptStore {
    pub fn new(db: SharedDatabase, ttl: Duration) -> Self {
        Self {
            db,
            cache: DashMap::new(),
            ttl,
        }
    }

    /// Enable or disable a template. Returns false when the slug is unknown.
    pub fn set_active(&self, slug: &str, active: bool) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let owned_slug = slug.to_string();
        let changed = self.db.transaction(move |conn| {
            conn.execute(
                "UPDATE prompts SET active = ?1, updated_at = ?2 WHERE slug = ?3",
                params![active, now, owned_slug],
            )
            .with_context_fn(|| format!("Failed to update prompt '{}'", owned_slug))
        })?;

        self.cache.remove(slug);
        Ok(changed > 0)
    }

    /// Drop every cached lookup
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached slugs (fresh or expired)
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn read_row(row: &Row<'_>) -> rusqlite::Result<PromptRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
        ))
    }

    fn decode(row: PromptRow) -> Result<PromptTemplate> {
        let (slug, title, prompt_type, body, variants, model, active) = row;

        let prompt_type: PromptType = prompt_type.parse().map_err(|e: String| {
            ForgeError::Storage(format!("Prompt '{}' has invalid type: {}", slug, e))
        })?;

        let variants: Option<BTreeMap<String, String>> = variants
            .filter(|v| !v.trim().is_empty())
            .map(|v| serde_json::from_str(&v))
            .transpose()
            .with_context_fn(|| format!("Corrupted variants JSON for prompt '{}'", slug))?;

        let model: ModelSettings = serde_json::from_str(&model)
            .with_context_fn(|| format!("Corrupted model JSON for prompt '{}'", slug))?;

        Ok(PromptTemplate {
            slug,
            title,
            prompt_type,
            body,
            variants,
            model,
            active,
        })
    }

    fn load(&self, slug: &str) -> Result<Option<PromptTemplate>> {
        let conn = self.db.connection()?;
        let row = conn
            .query_row(
                "SELECT slug, title, prompt_type, body, variants, model, active
                 FROM prompts WHERE slug = ?1",
                params![slug],
                Self::read_row,
            )
            .optional()
            .with_context_fn(|| format!("Failed to load prompt '{}'", slug))?;

        row.map(Self::decode).transpose()
    }
}

impl PromptStore for SqlitePromptStore {
    fn get_template(&self, slug: &str) -> Result<Option<PromptTemplate>> {
        if let Some(entry) = self.cache.get(slug)
            && entry.loaded_at.elapsed() < self.ttl
        {
            return Ok(entry.template.clone());
        }

        let template = self.load(slug)?.filter(|t| t.active);
        debug!("Prompt cache miss: {}", slug);

        self.cache.insert(
            slug.to_string(),
            CacheEntry {
                loaded_at: Instant::now(),
                template: template.clone(),
            },
        );
        Ok(template)
    }

    fn list_templates(&self) -> Result<Vec<PromptTemplate>> {
        let conn = self.db.connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT slug, title, prompt_type, body, variants, model, active
                 FROM prompts ORDER BY slug",
            )
            .with_context("Failed to prepare prompt listing")?;

        let rows = stmt
            .query_map([], Self::read_row)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context("Failed to list prompts")?;

        rows.into_iter().map(Self::decode).collect()
    }

    fn upsert(&self, template: PromptTemplate) -> Result<()> {
        let variants = template
            .variants
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let model = serde_json::to_string(&template.model)?;
        let now = chrono::Utc::now().to_rfc3339();

        let prompt_type = template.prompt_type.as_str();
        let PromptTemplate {
            slug,
            title,
            body,
            active,
            ..
        } = template;
        let cache_key = slug.clone();

        self.db.transaction(move |conn| {
            conn.execute(
                "INSERT INTO prompts (slug, title, prompt_type, body, variants, model, active, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(slug) DO UPDATE SET
                    title = excluded.title,
                    prompt_type = excluded.prompt_type,
                    body = excluded.body,
                    variants = excluded.variants,
                    model = excluded.model,
                    active = excluded.active,
                    updated_at = excluded.updated_at",
                params![slug, title, prompt_type, body, variants, model, active, now],
            )
            .with_context_fn(|| format!("Failed to store prompt '{}'", slug))
        })?;

        self.cache.remove(&cache_key);
        Ok(())
    }
}

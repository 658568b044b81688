//! Generation log
//!
//! Records finished generation runs against a post key so the CLI can show
//! the debug trail later and report aggregate statistics. The full
//! `GenerationResult` is stored as JSON; the columns next to it exist for
//! querying.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

use super::SharedDatabase;
use crate::types::{
    ForgeError, GenerateRequest, GenerationResult, LengthKey, PostKey, Result, ResultExt,
};

// =============================================================================
// Records
// =============================================================================

/// A generation run as read back from the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredGeneration {
    pub id: String,
    pub post_key: PostKey,
    pub title: String,
    pub length_key: LengthKey,
    pub created_at: DateTime<Utc>,
    pub result: GenerationResult,
}

impl StoredGeneration {
    pub fn summary(&self) -> GenerationSummary {
        GenerationSummary::from_result(&self.result, self.length_key, self.created_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Valid,
    OutOfRange,
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::OutOfRange => write!(f, "out_of_range"),
        }
    }
}

/// One-line view of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub length: LengthKey,
    pub target_range: String,
    pub word_count: u32,
    pub corrections: u8,
    pub status: GenerationStatus,
}

impl GenerationSummary {
    pub fn from_result(
        result: &GenerationResult,
        length: LengthKey,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            model: result.debug.initial_generation.request.model.clone(),
            length,
            target_range: format!(
                "{}-{}",
                result.word_count.target_min, result.word_count.target_max
            ),
            word_count: result.word_count.final_count,
            corrections: result.corrections.made,
            status: if result.word_count.valid {
                GenerationStatus::Valid
            } else {
                GenerationStatus::OutOfRange
            },
        }
    }
}

/// Aggregates over the whole log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub total: u64,
    pub today: u64,
    pub by_length: BTreeMap<String, u64>,
    /// Percentage of runs that ended within tolerance, rounded
    pub success_rate: u32,
    /// Mean corrections per run, one decimal
    pub avg_corrections: f64,
}

// =============================================================================
// Log
// =============================================================================

pub struct GenerationLog {
    db: SharedDatabase,
}

impl GenerationLog {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Store a finished run; returns the new record id
    pub fn record(
        &self,
        post_key: &PostKey,
        request: &GenerateRequest,
        result: &GenerationResult,
    ) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let result_json = serde_json::to_string(result)?;
        let now = Utc::now().to_rfc3339();

        let row_id = id.clone();
        let key = post_key.as_str().to_string();
        let title = request.title.clone();
        let length_key = request.length_key.as_str();
        let model = result.debug.initial_generation.request.model.clone();
        let valid = result.word_count.valid;
        let made = result.corrections.made;
        let initial = result.word_count.initial;
        let final_count = result.word_count.final_count;

        self.db.transaction(move |conn| {
            conn.execute(
                "INSERT INTO generations
                 (id, post_key, title, length_key, model, valid, corrections_made,
                  initial_words, final_words, result, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    row_id,
                    key,
                    title,
                    length_key,
                    model,
                    valid,
                    made,
                    initial,
                    final_count,
                    result_json,
                    now,
                ],
            )
            .with_context_fn(|| format!("Failed to record generation for '{}'", key))
        })?;

        info!("Recorded generation {} for '{}'", id, post_key);
        Ok(id)
    }

    /// Most recent run for a post key
    pub fn latest(&self, post_key: &PostKey) -> Result<Option<StoredGeneration>> {
        let conn = self.db.connection()?;
        let row = conn
            .query_row(
                "SELECT id, post_key, title, length_key, created_at, result
                 FROM generations WHERE post_key = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT 1",
                params![post_key.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()
            .with_context_fn(|| format!("Failed to load generation for '{}'", post_key))?;

        let Some((id, key, title, length_key, created_at, result)) = row else {
            return Ok(None);
        };

        let length_key: LengthKey = length_key
            .parse()
            .map_err(|e: String| ForgeError::Storage(format!("Generation {}: {}", id, e)))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .with_context_fn(|| format!("Invalid timestamp on generation {}", id))?
            .with_timezone(&Utc);
        let result: GenerationResult = serde_json::from_str(&result)
            .with_context_fn(|| format!("Corrupted result JSON on generation {}", id))?;

        Ok(Some(StoredGeneration {
            id,
            post_key: PostKey::new(key),
            title,
            length_key,
            created_at,
            result,
        }))
    }

    /// Aggregate statistics over every recorded run
    pub fn stats(&self) -> Result<GenerationStats> {
        let conn = self.db.connection()?;

        let (total, valid, corrections): (i64, i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(valid), 0), COALESCE(SUM(corrections_made), 0)
                 FROM generations",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .with_context("Failed to aggregate generations")?;

        let midnight = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc().to_rfc3339())
            .unwrap_or_default();
        let today: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM generations WHERE created_at >= ?1",
                params![midnight],
                |row| row.get(0),
            )
            .with_context("Failed to count today's generations")?;

        let mut stmt = conn
            .prepare("SELECT length_key, COUNT(*) FROM generations GROUP BY length_key")
            .with_context("Failed to prepare length breakdown")?;
        let by_length = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context("Failed to read length breakdown")?
            .into_iter()
            .map(|(key, count)| (key, count.max(0) as u64))
            .collect();

        let (success_rate, avg_corrections) = if total > 0 {
            let rate = (valid as f64 / total as f64 * 100.0).round() as u32;
            let avg = (corrections as f64 / total as f64 * 10.0).round() / 10.0;
            (rate, avg)
        } else {
            (0, 0.0)
        };

        Ok(GenerationStats {
            total: total.max(0) as u64,
            today: today.max(0) as u64,
            by_length,
            success_rate,
            avg_corrections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::TokenUsage;
    use crate::storage::Database;
    use crate::types::{
        CorrectionSummary, DebugTrail, InitialGenerationDebug, InitialRequestDebug,
        ResponseDebug, StopReason, WordCountSummary,
    };
    use std::sync::Arc;

    fn result(valid: bool, made: u8, final_count: u32) -> GenerationResult {
        GenerationResult {
            content_html: "<p>Body</p>".to_string(),
            category_name: "Energy".to_string(),
            tags: vec!["heat".to_string()],
            word_count: WordCountSummary {
                initial: 200,
                final_count,
                target_min: 300,
                target_max: 500,
                valid,
                message: String::new(),
            },
            corrections: CorrectionSummary {
                enabled: true,
                made,
                max_allowed: 2,
                stop_reason: if valid {
                    StopReason::Valid
                } else {
                    StopReason::BudgetExhausted
                },
                history: Vec::new(),
            },
            debug: DebugTrail {
                initial_generation: InitialGenerationDebug {
                    request: InitialRequestDebug {
                        model: "gpt-5".to_string(),
                        temperature: "1 (default)".to_string(),
                        max_tokens: 10_000,
                        response_format: "json_object".to_string(),
                        system_prompt_slug: "system-post-generation".to_string(),
                        user_prompt_slug: "post-generation".to_string(),
                        user_prompt_variant: "short".to_string(),
                        system_prompt_full: String::new(),
                        user_prompt_full: String::new(),
                    },
                    response: ResponseDebug {
                        status: 200,
                        model: "gpt-5".to_string(),
                        usage: TokenUsage::new(10, 20),
                        body_excerpt: String::new(),
                    },
                },
                corrections: Vec::new(),
            },
        }
    }

    fn request(length_key: LengthKey) -> GenerateRequest {
        GenerateRequest {
            title: "Heat pumps".to_string(),
            excerpt_or_context: String::new(),
            length_key,
            auto_correct: true,
            max_corrections: 2,
        }
    }

    fn log() -> GenerationLog {
        GenerationLog::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn test_record_and_latest() {
        let log = log();
        let key = PostKey::new("heat-pumps");

        log.record(&key, &request(LengthKey::Short), &result(false, 2, 240))
            .unwrap();
        let id = log
            .record(&key, &request(LengthKey::Short), &result(true, 1, 420))
            .unwrap();

        let stored = log.latest(&key).unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.title, "Heat pumps");
        assert_eq!(stored.length_key, LengthKey::Short);
        assert_eq!(stored.result, result(true, 1, 420));

        assert!(log.latest(&PostKey::new("other")).unwrap().is_none());
    }

    #[test]
    fn test_summary() {
        let log = log();
        let key = PostKey::new("p");
        log.record(&key, &request(LengthKey::Short), &result(false, 2, 240))
            .unwrap();

        let summary = log.latest(&key).unwrap().unwrap().summary();
        assert_eq!(summary.model, "gpt-5");
        assert_eq!(summary.target_range, "300-500");
        assert_eq!(summary.word_count, 240);
        assert_eq!(summary.corrections, 2);
        assert_eq!(summary.status, GenerationStatus::OutOfRange);
        assert_eq!(summary.status.to_string(), "out_of_range");
    }

    #[test]
    fn test_stats() {
        let log = log();
        let key = PostKey::new("p");
        log.record(&key, &request(LengthKey::Short), &result(true, 1, 400))
            .unwrap();
        log.record(&key, &request(LengthKey::Short), &result(true, 0, 400))
            .unwrap();
        log.record(&key, &request(LengthKey::Long), &result(false, 2, 900))
            .unwrap();

        let stats = log.stats().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.today, 3);
        assert_eq!(stats.by_length.get("short"), Some(&2));
        assert_eq!(stats.by_length.get("long"), Some(&1));
        assert_eq!(stats.success_rate, 67);
        assert_eq!(stats.avg_corrections, 1.0);
    }

    #[test]
    fn test_stats_empty_log() {
        let stats = log().stats().unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.success_rate, 0);
        assert_eq!(stats.avg_corrections, 0.0);
        assert!(stats.by_length.is_empty());
    }
}

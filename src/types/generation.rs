//! Generation request and result records.
//!
//! These are plain data crossing the library boundary: the host (CLI, web
//! handler) builds a [`GenerateRequest`] and receives a [`GenerationResult`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::ai::provider::TokenUsage;

// =============================================================================
// Length Keys
// =============================================================================

/// Target length selector
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum LengthKey {
    Short,
    #[default]
    Medium,
    Long,
    VeryLong,
}

impl LengthKey {
    pub const ALL: [LengthKey; 4] = [
        LengthKey::Short,
        LengthKey::Medium,
        LengthKey::Long,
        LengthKey::VeryLong,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LengthKey::Short => "short",
            LengthKey::Medium => "medium",
            LengthKey::Long => "long",
            LengthKey::VeryLong => "verylong",
        }
    }
}

impl fmt::Display for LengthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LengthKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(LengthKey::Short),
            "medium" => Ok(LengthKey::Medium),
            "long" => Ok(LengthKey::Long),
            "verylong" | "very-long" | "very_long" => Ok(LengthKey::VeryLong),
            _ => Err(format!(
                "Unknown length: {}. Valid values: short, medium, long, verylong",
                s
            )),
        }
    }
}

/// Word band and fallback token budget for one length key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthRange {
    pub min_words: u32,
    pub max_words: u32,
    /// Used when the generation prompt does not set its own max tokens
    pub max_tokens: u32,
}

impl LengthRange {
    pub const fn new(min_words: u32, max_words: u32, max_tokens: u32) -> Self {
        Self {
            min_words,
            max_words,
            max_tokens,
        }
    }

    /// "300-500"
    pub fn label(&self) -> String {
        format!("{}-{}", self.min_words, self.max_words)
    }
}

/// Length key to range lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LengthTable(BTreeMap<LengthKey, LengthRange>);

impl Default for LengthTable {
    fn default() -> Self {
        Self(BTreeMap::from([
            (LengthKey::Short, LengthRange::new(300, 500, 1200)),
            (LengthKey::Medium, LengthRange::new(800, 1200, 2200)),
            (LengthKey::Long, LengthRange::new(1500, 2000, 3200)),
            (LengthKey::VeryLong, LengthRange::new(2500, 3000, 4000)),
        ]))
    }
}

impl LengthTable {
    /// Range for a key. Keys missing from a user table fall back to the built-in band.
    pub fn range(&self, key: LengthKey) -> LengthRange {
        self.0.get(&key).copied().unwrap_or_else(|| {
            Self::default()
                .0
                .get(&key)
                .copied()
                .unwrap_or(LengthRange::new(300, 500, 1200))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LengthKey, &LengthRange)> {
        self.0.iter()
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Host-facing input for one generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub title: String,
    pub excerpt_or_context: String,
    pub length_key: LengthKey,
    pub auto_correct: bool,
    /// 0..=3; larger values are clamped
    pub max_corrections: u8,
}

/// Resolved per-run parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub title: String,
    pub excerpt_or_context: String,
    pub target_length_key: LengthKey,
    pub min_words: u32,
    pub max_words: u32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// Resolve a host request against the length table.
    ///
    /// `template_max_tokens` wins when positive; otherwise the table's budget applies.
    pub fn resolve(request: &GenerateRequest, table: &LengthTable, template_max_tokens: u32) -> Self {
        let range = table.range(request.length_key);
        let max_tokens = if template_max_tokens > 0 {
            template_max_tokens
        } else {
            range.max_tokens
        };

        Self {
            title: request.title.clone(),
            excerpt_or_context: request.excerpt_or_context.clone(),
            target_length_key: request.length_key,
            min_words: range.min_words,
            max_words: range.max_words,
            max_tokens,
        }
    }
}

// =============================================================================
// Corrections
// =============================================================================

/// Which way a correction pushes the word count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Expand,
    Shorten,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Expand => "expand",
            Direction::Shorten => "shorten",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What was sent for one correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRequestDebug {
    pub model: String,
    /// Temperature as displayed, e.g. "0.3" or "1 (default)"
    pub temperature: String,
    pub max_tokens: u32,
    pub response_format: String,
    pub system_prompt_slug: String,
    pub user_prompt_slug: String,
    pub current_words: u32,
    pub target_words: u32,
    pub min_words: u32,
    pub max_words: u32,
}

/// What came back for one correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionResponseDebug {
    pub status: u16,
    pub model: String,
    pub new_word_count: u32,
    pub usage: TokenUsage,
}

/// One applied correction. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub attempt: u8,
    pub direction: Direction,
    pub before_words: u32,
    pub after_words: u32,
    pub request: CorrectionRequestDebug,
    pub response: CorrectionResponseDebug,
}

/// One correction attempt in the debug trail, including failed ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionAttemptDebug {
    pub attempt: u8,
    pub direction: Direction,
    pub before_words: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<CorrectionRequestDebug>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<CorrectionResponseDebug>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Why the correction loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Content is inside the tolerance band
    Valid,
    /// Auto-correct off or a zero budget
    Disabled,
    /// All allowed corrections were spent
    BudgetExhausted,
    /// A correction call failed; the last good content was kept
    CorrectionFailed,
}

// =============================================================================
// Result
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCountSummary {
    pub initial: u32,
    #[serde(rename = "final")]
    pub final_count: u32,
    pub target_min: u32,
    pub target_max: u32,
    pub valid: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionSummary {
    pub enabled: bool,
    pub made: u8,
    pub max_allowed: u8,
    pub stop_reason: StopReason,
    pub history: Vec<CorrectionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialRequestDebug {
    pub model: String,
    pub temperature: String,
    pub max_tokens: u32,
    pub response_format: String,
    pub system_prompt_slug: String,
    pub user_prompt_slug: String,
    pub user_prompt_variant: String,
    pub system_prompt_full: String,
    pub user_prompt_full: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDebug {
    pub status: u16,
    pub model: String,
    pub usage: TokenUsage,
    pub body_excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialGenerationDebug {
    pub request: InitialRequestDebug,
    pub response: ResponseDebug,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugTrail {
    pub initial_generation: InitialGenerationDebug,
    pub corrections: Vec<CorrectionAttemptDebug>,
}

/// The sole output of a generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub content_html: String,
    pub category_name: String,
    pub tags: Vec<String>,
    pub word_count: WordCountSummary,
    pub corrections: CorrectionSummary,
    pub debug: DebugTrail,
}

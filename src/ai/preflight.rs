//! Pre-flight Validation Checks
//!
//! Validates configuration and prompts before a generation run spends
//! tokens.
//!
//! ## Checks
//!
//! - API key presence
//! - Required prompt slugs (and every generation length variant)
//! - Prompt lint: unknown placeholders, missing JSON or STRUCTURE hints
//! - Length table sanity
//!
//! Lint findings are warnings; everything else blocks.

use std::time::Instant;
use tracing::{info, warn};

use crate::ai::prompt::{PromptStore, missing_required_prompts};
use crate::config::Config;
use crate::types::{ForgeError, Result};

/// Pre-flight check results
#[derive(Debug, Clone)]
pub struct PreflightResult {
    /// All checks passed
    pub passed: bool,
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Warnings (non-blocking)
    pub warnings: Vec<String>,
    /// Errors (blocking)
    pub errors: Vec<String>,
    /// Recommendations
    pub recommendations: Vec<String>,
}

impl PreflightResult {
    pub fn new() -> Self {
        Self {
            passed: true,
            checks: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    fn add_check(&mut self, check: CheckResult) {
        if !check.passed {
            self.passed = false;
            self.errors.push(check.message.clone());
        }
        if let Some(ref warn) = check.warning {
            self.warnings.push(warn.clone());
        }
        self.checks.push(check);
    }

    fn add_recommendation(&mut self, rec: String) {
        self.recommendations.push(rec);
    }

    /// Collapse blocking failures into a single configuration error
    pub fn into_result(self) -> Result<Self> {
        if self.passed {
            Ok(self)
        } else {
            Err(ForgeError::Config(format!(
                "Pre-flight checks failed: {}",
                self.errors.join("; ")
            )))
        }
    }
}

impl Default for PreflightResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Individual check result
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub warning: Option<String>,
    pub duration_ms: u64,
}

/// Pre-flight validation checker
pub struct PreflightCheck;

impl PreflightCheck {
    /// Run all checks for a generation run
    pub fn check_generation(config: &Config, store: &dyn PromptStore) -> Result<PreflightResult> {
        let mut result = PreflightResult::new();

        info!("Running pre-flight checks...");

        Self::check_api_key(config, &mut result);
        Self::check_required_prompts(store, &mut result)?;
        Self::check_prompt_lint(store, &mut result)?;
        Self::check_length_table(config, &mut result);

        if result.passed {
            info!("Pre-flight checks passed ({} checks)", result.checks.len());
        } else {
            warn!("Pre-flight checks failed: {} errors", result.errors.len());
        }

        Ok(result)
    }

    fn check_api_key(config: &Config, result: &mut PreflightResult) {
        let start = Instant::now();
        let passed = config.openai.resolve_api_key().is_some();

        result.add_check(CheckResult {
            name: "api_key".to_string(),
            passed,
            message: if passed {
                "OpenAI API key configured".to_string()
            } else {
                "OpenAI API key not configured".to_string()
            },
            warning: None,
            duration_ms: start.elapsed().as_millis() as u64,
        });

        if !passed {
            result.add_recommendation(
                "Set OPENAI_API_KEY or openai.api_key in the config file".to_string(),
            );
        }
    }

    fn check_required_prompts(store: &dyn PromptStore, result: &mut PreflightResult) -> Result<()> {
        let start = Instant::now();
        let missing = missing_required_prompts(store)?;
        let passed = missing.is_empty();

        result.add_check(CheckResult {
            name: "required_prompts".to_string(),
            passed,
            message: if passed {
                "All required prompts present".to_string()
            } else {
                format!("Missing prompts: {}", missing.join(", "))
            },
            warning: None,
            duration_ms: start.elapsed().as_millis() as u64,
        });

        if !passed {
            result.add_recommendation(
                "Run `postforge prompts seed` to install the default prompts".to_string(),
            );
        }
        Ok(())
    }

    fn check_prompt_lint(store: &dyn PromptStore, result: &mut PreflightResult) -> Result<()> {
        let start = Instant::now();

        let findings: Vec<String> = store
            .list_templates()?
            .iter()
            .filter(|t| t.active)
            .flat_map(|t| t.lint())
            .collect();

        result.add_check(CheckResult {
            name: "prompt_lint".to_string(),
            passed: true,
            message: format!("{} lint finding(s)", findings.len()),
            warning: (!findings.is_empty()).then(|| findings.join("; ")),
            duration_ms: start.elapsed().as_millis() as u64,
        });
        Ok(())
    }

    fn check_length_table(config: &Config, result: &mut PreflightResult) {
        let start = Instant::now();

        let invalid: Vec<String> = config
            .lengths
            .iter()
            .filter(|(_, range)| range.min_words == 0 || range.min_words >= range.max_words)
            .map(|(key, range)| format!("{} ({})", key, range.label()))
            .collect();
        let passed = invalid.is_empty();

        result.add_check(CheckResult {
            name: "length_table".to_string(),
            passed,
            message: if passed {
                "Length bands valid".to_string()
            } else {
                format!("Invalid length bands: {}", invalid.join(", "))
            },
            warning: None,
            duration_ms: start.elapsed().as_millis() as u64,
        });
    }
}

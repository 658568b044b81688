//! Generation Pipeline
//!
//! Orchestrates one generation run:
//!
//! ```text
//! Init ─► InitialGeneration ─► Validating ─┬─► Done(valid)
//!                                  ▲       ├─► Done(disabled | budget exhausted)
//!                                  │       └─► Correcting(direction)
//!                                  └──────────────────┘  (success)
//!                         Correcting ── failure ──► Done(correction failed)
//! ```
//!
//! Failures before the correction loop (missing prompt, transport, parse)
//! end the run with an error. Failures inside the loop stop it and return
//! the last good content with the failure recorded in the debug trail.

mod correction;

pub use correction::{
    Correction, CorrectionEngine, CorrectionFailure, CorrectionPrompts, direction_instruction,
    target_words,
};

use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::ai::prompt::{Placeholder, PromptVars, SharedPromptStore, render};
use crate::ai::provider::{CompletionContent, CompletionRequest, OpenAiClient, SharedClient};
use crate::ai::timeout::with_timeout;
use crate::ai::validation::{GeneratedPost, excerpt, extract_json_object};
use crate::config::{Config, EditorialConfig};
use crate::constants::{correction as correction_constants, display, prompts};
use crate::content::{LengthCheck, count_words, validate_length};
use crate::types::{
    CorrectionAttemptDebug, CorrectionRecord, CorrectionSummary, DebugTrail, Direction,
    ForgeError, GenerateRequest, GenerationRequest, GenerationResult, InitialGenerationDebug,
    InitialRequestDebug, LengthTable, ResponseDebug, Result, StopReason, WordCountSummary,
};

// =============================================================================
// Configuration
// =============================================================================

/// Everything a run needs besides the client and the prompt store
#[derive(Clone)]
pub struct PipelineConfig {
    pub api_key: Option<SecretString>,
    pub api_base: String,
    pub editorial: EditorialConfig,
    pub lengths: LengthTable,
    pub request_timeout: Duration,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.openai.resolve_api_key(),
            api_base: config.openai.api_base.clone(),
            editorial: config.editorial.clone(),
            lengths: config.lengths.clone(),
            request_timeout: Duration::from_secs(config.openai.timeout_secs),
        }
    }
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("editorial", &self.editorial)
            .field("lengths", &self.lengths)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

// =============================================================================
// States
// =============================================================================

/// States of the correction loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Validating,
    Correcting(Direction),
    Done(StopReason),
}

/// Transition out of `Validating`
pub fn next_step(check: &LengthCheck, made: u8, max_allowed: u8, auto_correct: bool) -> LoopState {
    let direction = match check.direction {
        None => return LoopState::Done(StopReason::Valid),
        Some(direction) => direction,
    };

    if !auto_correct || max_allowed == 0 {
        LoopState::Done(StopReason::Disabled)
    } else if made >= max_allowed {
        LoopState::Done(StopReason::BudgetExhausted)
    } else {
        LoopState::Correcting(direction)
    }
}

/// Clamp a requested correction budget to the hard limit
pub fn clamp_max_corrections(requested: u8) -> u8 {
    if requested > correction_constants::MAX_CORRECTIONS_LIMIT {
        warn!(
            "max_corrections {} exceeds limit, clamping to {}",
            requested,
            correction_constants::MAX_CORRECTIONS_LIMIT
        );
        correction_constants::MAX_CORRECTIONS_LIMIT
    } else {
        requested
    }
}

// =============================================================================
// Run Context
// =============================================================================

/// Prompts resolved in `Init`
struct PreparedRun {
    request: GenerationRequest,
    vars: PromptVars,
    completion: CompletionRequest,
    initial_debug: InitialRequestDebug,
    expand: Option<CorrectionPrompts>,
    shorten: Option<CorrectionPrompts>,
}

impl PreparedRun {
    fn correction_prompts(&self, direction: Direction) -> Option<&CorrectionPrompts> {
        match direction {
            Direction::Expand => self.expand.as_ref(),
            Direction::Shorten => self.shorten.as_ref(),
        }
    }
}

/// Output of `InitialGeneration`
struct Draft {
    post: GeneratedPost,
    word_count: u32,
    debug: InitialGenerationDebug,
}

// =============================================================================
// Pipeline
// =============================================================================

pub struct GenerationPipeline {
    client: SharedClient,
    store: SharedPromptStore,
    config: PipelineConfig,
}

impl GenerationPipeline {
    pub fn new(client: SharedClient, store: SharedPromptStore, config: PipelineConfig) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    /// Pipeline backed by the OpenAI HTTP client
    pub fn openai(config: PipelineConfig, store: SharedPromptStore) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ForgeError::Config(
                "OpenAI API key not configured (set openai.api_key or OPENAI_API_KEY)".to_string(),
            )
        })?;
        let client = OpenAiClient::new(api_key, &config.api_base, config.request_timeout)?;
        Ok(Self::new(Arc::new(client), store, config))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one generation to completion
    pub async fn run(&self, request: &GenerateRequest) -> Result<GenerationResult> {
        let max_allowed = clamp_max_corrections(request.max_corrections);
        let corrections_possible = request.auto_correct && max_allowed > 0;

        debug!("State: Init");
        let prepared = self.prepare(request, corrections_possible)?;

        debug!("State: InitialGeneration");
        let draft = self.generate_initial(&prepared).await?;

        let min_words = prepared.request.min_words;
        let max_words = prepared.request.max_words;

        let mut content = draft.post.content_html.clone();
        let mut word_count = draft.word_count;
        let mut made: u8 = 0;
        let mut history: Vec<CorrectionRecord> = Vec::new();
        let mut attempts: Vec<CorrectionAttemptDebug> = Vec::new();
        let mut check = validate_length(word_count, min_words, max_words);
        debug!("State: Validating ({})", check.message);
        let mut state = next_step(&check, made, max_allowed, request.auto_correct);

        let engine = CorrectionEngine::new(self.client.as_ref(), self.config.request_timeout);

        let stop_reason = loop {
            state = match state {
                LoopState::Validating => {
                    check = validate_length(word_count, min_words, max_words);
                    debug!("State: Validating ({})", check.message);
                    next_step(&check, made, max_allowed, request.auto_correct)
                }
                LoopState::Correcting(direction) => {
                    debug!("State: Correcting({})", direction);
                    let attempt = made + 1;

                    let Some(correction_prompts) = prepared.correction_prompts(direction) else {
                        break StopReason::Disabled;
                    };

                    match engine
                        .correct(
                            &content,
                            word_count,
                            min_words,
                            max_words,
                            direction,
                            correction_prompts,
                            &prepared.vars,
                        )
                        .await
                    {
                        Ok(correction) => {
                            info!(
                                "Correction {} ({}): {} -> {} words",
                                attempt, direction, word_count, correction.word_count
                            );

                            attempts.push(CorrectionAttemptDebug {
                                attempt,
                                direction,
                                before_words: word_count,
                                request: Some(correction.request.clone()),
                                response: Some(correction.response.clone()),
                                error: None,
                            });
                            history.push(CorrectionRecord {
                                attempt,
                                direction,
                                before_words: word_count,
                                after_words: correction.word_count,
                                request: correction.request,
                                response: correction.response,
                            });

                            content = correction.content;
                            word_count = correction.word_count;
                            made = attempt;
                            LoopState::Validating
                        }
                        Err(failure) => {
                            warn!(
                                "Correction {} ({}) failed, keeping previous content: {}",
                                attempt, direction, failure.error
                            );

                            attempts.push(CorrectionAttemptDebug {
                                attempt,
                                direction,
                                before_words: word_count,
                                request: failure.request,
                                response: None,
                                error: Some(failure.error.to_string()),
                            });
                            LoopState::Done(StopReason::CorrectionFailed)
                        }
                    }
                }
                LoopState::Done(reason) => break reason,
            };
        };

        info!(
            "Generation finished: {} words ({}), {} correction(s), stop: {:?}",
            word_count,
            if check.valid { "valid" } else { "out of range" },
            made,
            stop_reason
        );

        Ok(GenerationResult {
            content_html: content,
            category_name: draft.post.category_name,
            tags: draft.post.tags,
            word_count: WordCountSummary {
                initial: draft.word_count,
                final_count: word_count,
                target_min: min_words,
                target_max: max_words,
                valid: check.valid,
                message: check.message,
            },
            corrections: CorrectionSummary {
                enabled: request.auto_correct,
                made,
                max_allowed,
                stop_reason,
                history,
            },
            debug: DebugTrail {
                initial_generation: draft.debug,
                corrections: attempts,
            },
        })
    }

    /// Resolve prompts and build the initial request
    fn prepare(&self, request: &GenerateRequest, corrections_possible: bool) -> Result<PreparedRun> {
        let length_key = request.length_key;

        let template = self
            .store
            .get_template(prompts::POST_GENERATION)?
            .ok_or_else(|| {
                ForgeError::prompt_not_found(prompts::POST_GENERATION, Some(length_key.as_str()))
            })?;
        let user_text = template.text_for(Some(length_key.as_str()))?.to_string();
        let model_config = template.model_config();

        let resolved = GenerationRequest::resolve(
            request,
            &self.config.lengths,
            template.model.max_tokens.unwrap_or(0),
        );

        let system_text = self.store.get_prompt(prompts::SYSTEM_POST_GENERATION, None)?;

        let editorial = &self.config.editorial;
        let vars = PromptVars::new()
            .set(Placeholder::PostTitle, &resolved.title)
            .set(Placeholder::PostExcerpt, &resolved.excerpt_or_context)
            .set(Placeholder::MinWords, resolved.min_words)
            .set(Placeholder::MaxWords, resolved.max_words)
            .set(
                Placeholder::TargetWords,
                target_words(resolved.min_words, resolved.max_words),
            )
            .set(Placeholder::Length, length_key)
            .set(Placeholder::EditorialLine, &editorial.editorial_line)
            .set(Placeholder::AuthorStyle, &editorial.author_style)
            .set(Placeholder::TargetAudience, &editorial.target_audience);

        let system_prompt = render(&system_text, &vars)?;
        let user_prompt = render(&user_text, &vars)?;

        let completion = CompletionRequest {
            model: model_config.model.clone(),
            system_prompt,
            user_prompt,
            max_tokens: resolved.max_tokens,
            temperature: model_config.temperature,
            response_format: model_config.response_format,
        };

        let initial_debug = InitialRequestDebug {
            model: completion.model.clone(),
            temperature: completion.display_temperature(),
            max_tokens: completion.max_tokens,
            response_format: completion.response_format.to_string(),
            system_prompt_slug: prompts::SYSTEM_POST_GENERATION.to_string(),
            user_prompt_slug: prompts::POST_GENERATION.to_string(),
            user_prompt_variant: length_key.to_string(),
            system_prompt_full: completion.system_prompt.clone(),
            user_prompt_full: completion.user_prompt.clone(),
        };

        let (expand, shorten) = if corrections_possible {
            (
                Some(self.correction_prompts(prompts::CORRECTION_EXPAND)?),
                Some(self.correction_prompts(prompts::CORRECTION_SHORTEN)?),
            )
        } else {
            (None, None)
        };

        info!(
            "Prepared generation: \"{}\" ({}, {}), model {}",
            resolved.title,
            length_key,
            resolved_label(&resolved),
            completion.model
        );

        Ok(PreparedRun {
            request: resolved,
            vars,
            completion,
            initial_debug,
            expand,
            shorten,
        })
    }

    fn correction_prompts(&self, user_slug: &str) -> Result<CorrectionPrompts> {
        Ok(CorrectionPrompts {
            system_slug: prompts::SYSTEM_CORRECTION.to_string(),
            system_text: self.store.get_prompt(prompts::SYSTEM_CORRECTION, None)?,
            user_slug: user_slug.to_string(),
            user_text: self.store.get_prompt(user_slug, None)?,
            config: self.store.get_config(user_slug)?,
        })
    }

    /// Call the model for the first draft and parse its JSON payload
    async fn generate_initial(&self, prepared: &PreparedRun) -> Result<Draft> {
        let completion = with_timeout(
            self.config.request_timeout,
            self.client.complete(&prepared.completion),
            "initial generation",
        )
        .await?;

        let body_excerpt = excerpt(&completion.raw_body, display::BODY_EXCERPT_CHARS);

        let value = match &completion.content {
            CompletionContent::Json(value) => value.clone(),
            CompletionContent::Text(text) => extract_json_object(text)?,
        };

        let post = GeneratedPost::from_value(&value).inspect_err(|e| {
            warn!("Initial generation payload rejected: {} ({})", e, body_excerpt);
        })?;

        let word_count = count_words(&post.content_html);
        info!(
            "Initial generation: {} words (target {}-{})",
            word_count, prepared.request.min_words, prepared.request.max_words
        );

        Ok(Draft {
            post,
            word_count,
            debug: InitialGenerationDebug {
                request: prepared.initial_debug.clone(),
                response: ResponseDebug {
                    status: completion.status,
                    model: completion.model_used,
                    usage: completion.usage,
                    body_excerpt,
                },
            },
        })
    }
}

fn resolved_label(request: &GenerationRequest) -> String {
    format!("{}-{} words", request.min_words, request.max_words)
}

//! Generate Command
//!
//! Runs one generation with length correction and prints the outcome.
//!
//! Usage:
//!   postforge generate [--title T] [--context C] [--length short|medium|long|verylong]
//!                      [--no-auto-correct] [--max-corrections N] [--post-key K]
//!                      [--save] [--format text|json]

use rand::seq::IndexedRandom;

use crate::ai::preflight::PreflightCheck;
use crate::cli::ui::Output;
use crate::cli::{CommandContext, OutputFormat};
use crate::config::Config;
use crate::constants::display;
use crate::content::plain_text;
use crate::pipeline::{GenerationPipeline, PipelineConfig};
use crate::types::{GenerateRequest, GenerationResult, LengthKey, PostKey, Result};

/// Titles used when none is given
const SAMPLE_TITLES: &[&str] = &[
    "How heat pumps work in older houses",
    "A beginner's guide to balcony solar panels",
    "Choosing a standing desk that lasts",
    "What to know before adopting a rescue dog",
    "Meal prepping for a busy work week",
    "The basics of composting in a small apartment",
];

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub title: Option<String>,
    pub context: Option<String>,
    pub length: Option<LengthKey>,
    pub no_auto_correct: bool,
    pub max_corrections: Option<u8>,
    pub post_key: Option<String>,
    pub save: bool,
    pub format: OutputFormat,
}

/// Merge command options with configured defaults
pub fn build_request(options: &GenerateOptions, config: &Config) -> GenerateRequest {
    let title = options
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| {
            SAMPLE_TITLES
                .choose(&mut rand::rng())
                .copied()
                .unwrap_or(SAMPLE_TITLES[0])
                .to_string()
        });

    GenerateRequest {
        excerpt_or_context: options.context.clone().unwrap_or_default(),
        title,
        length_key: options.length.unwrap_or(config.generation.default_length),
        auto_correct: config.generation.auto_correct && !options.no_auto_correct,
        max_corrections: options
            .max_corrections
            .unwrap_or(config.generation.max_corrections),
    }
}

/// Plain-text preview of generated HTML
pub fn preview(html: &str, max_chars: usize) -> String {
    crate::ai::validation::excerpt(&plain_text(html), max_chars)
}

pub async fn run(ctx: &CommandContext, options: GenerateOptions) -> Result<()> {
    PreflightCheck::check_generation(&ctx.config, ctx.store.as_ref())?.into_result()?;

    let request = build_request(&options, &ctx.config);
    let pipeline = GenerationPipeline::openai(
        PipelineConfig::from_config(&ctx.config),
        ctx.store.clone(),
    )?;

    let result = pipeline.run(&request).await?;

    let saved = if options.save {
        let post_key = options
            .post_key
            .as_deref()
            .map(PostKey::from)
            .unwrap_or_else(|| PostKey::from_title(&request.title));
        ctx.generation_log().record(&post_key, &request, &result)?;
        Some(post_key)
    } else {
        None
    };

    match options.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&result)?),
        OutputFormat::Text => print_result(&request, &result),
    }

    if let Some(post_key) = saved
        && options.format == OutputFormat::Text
    {
        Output::new().success(&format!("Saved as '{}'", post_key));
    }

    Ok(())
}

fn print_result(request: &GenerateRequest, result: &GenerationResult) {
    let out = Output::new();

    out.header(&request.title);
    out.field("Length", request.length_key);
    out.field(
        "Target",
        format!(
            "{}-{} words",
            result.word_count.target_min, result.word_count.target_max
        ),
    );
    out.field("Initial", format!("{} words", result.word_count.initial));
    out.field("Final", format!("{} words", result.word_count.final_count));
    out.status(result.word_count.valid, &result.word_count.message);

    out.section("Corrections");
    if !result.corrections.enabled {
        out.info("Auto-correction disabled");
    }
    out.field(
        "Made",
        format!(
            "{} of {}",
            result.corrections.made, result.corrections.max_allowed
        ),
    );
    out.field("Stopped", format!("{:?}", result.corrections.stop_reason));
    for record in &result.corrections.history {
        out.field(
            &format!("#{} {}", record.attempt, record.direction),
            format!("{} -> {} words", record.before_words, record.after_words),
        );
    }
    for attempt in result.debug.corrections.iter().filter(|a| a.error.is_some()) {
        out.warning(&format!(
            "Correction {} failed: {}",
            attempt.attempt,
            attempt.error.as_deref().unwrap_or_default()
        ));
    }

    out.section("Post");
    out.field("Category", &result.category_name);
    out.field("Tags", result.tags.join(", "));

    out.section("Preview");
    out.block(&preview(&result.content_html, display::PREVIEW_CHARS));
}

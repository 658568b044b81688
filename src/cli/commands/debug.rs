//! Debug Command
//!
//! Shows the recorded debug trail of the latest generation for a post.
//!
//! Usage:
//!   postforge debug <post-key> [--format text|json|yaml]

use crate::cli::ui::Output;
use crate::cli::{CommandContext, OutputFormat};
use crate::storage::StoredGeneration;
use crate::types::{ForgeError, PostKey, Result};

pub fn run(ctx: &CommandContext, post_key: &str, format: OutputFormat) -> Result<()> {
    let post_key = PostKey::from(post_key);
    let stored = ctx.generation_log().latest(&post_key)?.ok_or_else(|| {
        ForgeError::Storage(format!("No generation recorded for '{}'", post_key))
    })?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stored)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&stored)?),
        OutputFormat::Text => print_trail(&stored),
    }
    Ok(())
}

fn print_trail(stored: &StoredGeneration) {
    let out = Output::new();
    let summary = stored.summary();
    let initial = &stored.result.debug.initial_generation;

    out.header(&format!("{} ({})", stored.title, stored.post_key));
    out.field("Generated", summary.timestamp.to_rfc3339());
    out.field("Model", &summary.model);
    out.field("Length", format!("{} ({})", summary.length, summary.target_range));
    out.field("Words", summary.word_count);
    out.field("Corrections", summary.corrections);
    out.field("Status", summary.status);

    out.section("Initial generation");
    out.field("Model", &initial.request.model);
    out.field("Temperature", &initial.request.temperature);
    out.field("Max tokens", initial.request.max_tokens);
    out.field("Response format", &initial.request.response_format);
    out.field(
        "Prompts",
        format!(
            "{} + {} [{}]",
            initial.request.system_prompt_slug,
            initial.request.user_prompt_slug,
            initial.request.user_prompt_variant
        ),
    );
    out.field("HTTP status", initial.response.status);
    out.field("Response model", &initial.response.model);
    out.field(
        "Tokens",
        format!(
            "{} prompt / {} completion",
            initial.response.usage.prompt_tokens, initial.response.usage.completion_tokens
        ),
    );

    if stored.result.debug.corrections.is_empty() {
        return;
    }

    out.section("Correction attempts");
    for attempt in &stored.result.debug.corrections {
        let outcome = match (&attempt.response, &attempt.error) {
            (Some(response), _) => format!(
                "{} -> {} words",
                attempt.before_words, response.new_word_count
            ),
            (None, Some(error)) => format!("failed: {}", error),
            (None, None) => "no response".to_string(),
        };
        out.field(&format!("#{} {}", attempt.attempt, attempt.direction), outcome);

        if let Some(request) = &attempt.request {
            out.field(
                "  request",
                format!(
                    "{} (temp {}), target {} in {}-{}",
                    request.model,
                    request.temperature,
                    request.target_words,
                    request.min_words,
                    request.max_words
                ),
            );
        }
    }
}

//! Stats Command
//!
//! Aggregate statistics over the generation log.

use crate::cli::ui::Output;
use crate::cli::{CommandContext, OutputFormat};
use crate::types::Result;

pub fn run(ctx: &CommandContext, format: OutputFormat) -> Result<()> {
    let stats = ctx.generation_log().stats()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&stats)?),
        OutputFormat::Text => {
            let out = Output::new();
            out.header("Generation statistics");
            out.field("Total", stats.total);
            out.field("Today", stats.today);
            out.field("Success rate", format!("{}%", stats.success_rate));
            out.field("Avg corrections", format!("{:.1}", stats.avg_corrections));

            if !stats.by_length.is_empty() {
                out.section("By length");
                for (length, count) in &stats.by_length {
                    out.field(length, count);
                }
            }
        }
    }
    Ok(())
}

pub mod commands;
pub mod ui;
pub mod util;

pub use util::CommandContext;

/// Output format for commands that print structured data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

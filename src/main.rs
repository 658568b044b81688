use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postforge::LengthKey;
use postforge::cli::commands;
use postforge::cli::{CommandContext, OutputFormat};
use postforge::constants::image;

/// Parse length key from string
fn parse_length(s: &str) -> Result<LengthKey, String> {
    s.parse()
}

/// Parse images-per-request, clamped to the API limit
fn parse_image_count(s: &str) -> Result<u8, String> {
    let n: u8 = s
        .parse()
        .map_err(|_| format!("Invalid count '{}'. Expected 1-{}", s, image::MAX_IMAGES))?;
    if n == 0 || n > image::MAX_IMAGES {
        return Err(format!(
            "Invalid count '{}'. Expected 1-{}",
            s,
            image::MAX_IMAGES
        ));
    }
    Ok(n)
}

#[derive(Parser)]
#[command(name = "postforge")]
#[command(
    version,
    about = "Blog post generation with automatic length correction"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, help = "Load configuration from this file only")]
    config: Option<PathBuf>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a post and correct its length
    Generate {
        #[arg(long, short, help = "Post title (random sample title when omitted)")]
        title: Option<String>,
        #[arg(long, help = "Additional context for the post")]
        context: Option<String>,
        #[arg(long, short, value_parser = parse_length, help = "Length: short, medium, long, verylong")]
        length: Option<LengthKey>,
        #[arg(long, help = "Skip length correction")]
        no_auto_correct: bool,
        #[arg(long, help = "Correction attempts (capped at 3)")]
        max_corrections: Option<u8>,
        #[arg(long, help = "Key to record the generation under")]
        post_key: Option<String>,
        #[arg(long, help = "Record the result in the generation log")]
        save: bool,
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the debug trail of the latest generation for a post
    Debug {
        #[arg(help = "Post key")]
        post_key: String,
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show generation statistics
    Stats {
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Manage prompt templates
    Prompts {
        #[command(subcommand)]
        action: PromptsAction,
    },

    /// Generate featured images for a post
    Image {
        #[arg(long, short, help = "Post title")]
        title: String,
        #[arg(long, help = "What the post is about")]
        context: Option<String>,
        #[arg(short = 'n', long, default_value = "1", value_parser = parse_image_count)]
        count: u8,
        #[arg(long, short, default_value = ".", help = "Output directory")]
        out: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum PromptsAction {
    /// List stored templates
    List,
    /// Show one template
    Show {
        slug: String,
        #[arg(long, help = "Variant name (e.g. short, medium, long)")]
        variant: Option<String>,
    },
    /// Verify required prompts are present
    Check,
    /// Install default prompts that are missing
    Seed,
    /// Import templates from a YAML file
    Import { file: PathBuf },
    /// Export templates to a YAML file
    Export { file: PathBuf },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mpostforge encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config;
    let load = || CommandContext::load(config_path.as_deref());

    match cli.command {
        Commands::Generate {
            title,
            context,
            length,
            no_auto_correct,
            max_corrections,
            post_key,
            save,
            format,
        } => {
            let ctx = load()?;
            let rt = Runtime::new()?;
            rt.block_on(commands::generate::run(
                &ctx,
                commands::generate::GenerateOptions {
                    title,
                    context,
                    length,
                    no_auto_correct,
                    max_corrections,
                    post_key,
                    save,
                    format,
                },
            ))?;
        }
        Commands::Debug { post_key, format } => {
            commands::debug::run(&load()?, &post_key, format)?;
        }
        Commands::Stats { format } => {
            commands::stats::run(&load()?, format)?;
        }
        Commands::Prompts { action } => {
            let ctx = load()?;
            match action {
                PromptsAction::List => commands::prompts::list(&ctx)?,
                PromptsAction::Show { slug, variant } => {
                    commands::prompts::show(&ctx, &slug, variant.as_deref())?
                }
                PromptsAction::Check => commands::prompts::check(&ctx)?,
                PromptsAction::Seed => {
                    commands::prompts::seed(&ctx)?;
                }
                PromptsAction::Import { file } => {
                    commands::prompts::import(&ctx, &file)?;
                }
                PromptsAction::Export { file } => {
                    commands::prompts::export(&ctx, &file)?;
                }
            }
        }
        Commands::Image {
            title,
            context,
            count,
            out,
        } => {
            let ctx = load()?;
            let rt = Runtime::new()?;
            rt.block_on(commands::image::run(
                &ctx,
                commands::image::ImageOptions {
                    title,
                    context,
                    count,
                    out,
                },
            ))?;
        }
        Commands::Config { action } => {
            // Config commands must work before a database exists
            let config = match &config_path {
                Some(path) => postforge::ConfigLoader::load_from_file(path)?,
                None => postforge::ConfigLoader::load()?,
            };
            match action {
                ConfigAction::Show { format } => commands::config::show(&config, format)?,
                ConfigAction::Path => commands::config::path(&config)?,
                ConfigAction::Init { global, force } => commands::config::init(global, force)?,
            }
        }
    }

    Ok(())
}

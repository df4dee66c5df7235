use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand, crate_version};
use std::path::PathBuf;

pub const DEFAULT_LOG_FILE: &str = "theme-extract-debug.log";

/// CLI structure defining the available commands and global arguments
#[derive(Parser)]
#[command(
    author,
    version = crate_version!(),
    about = "theme-extract: LLM-backed theme extraction and evaluation for patient reviews",
    long_about = "Extracts thematic labels from free-text patient reviews via an \
                  OpenAI-compatible completion endpoint and scores the predictions \
                  against human-annotated ground truth.",
    styles = get_styles(),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log debug messages to a file
    #[arg(
        short = 'l',
        long = "log",
        global = true,
        help = "Log debug messages to a file"
    )]
    pub log: bool,

    /// Specify a custom log file path
    #[arg(
        long = "log-file",
        global = true,
        help = "Specify a custom log file path"
    )]
    pub log_file: Option<String>,

    /// Suppress non-essential output (progress bars, log echo)
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress non-essential output"
    )]
    pub quiet: bool,
}

/// Enumeration of available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Extract themes for every review in a CSV file and score the result
    #[command(about = "Extract themes for a review file and score the predictions")]
    Run {
        /// CSV file with `Comment` and `ProcessedCode` columns
        #[arg(short, long, help = "CSV file with Comment and ProcessedCode columns")]
        input: PathBuf,

        /// Process at most this many reviews
        #[arg(long, help = "Process at most this many reviews")]
        limit: Option<usize>,

        /// Include rows without ground-truth annotations
        #[arg(long, help = "Include rows without ground-truth annotations")]
        all_rows: bool,

        /// Skip the evaluation step and only report run metrics
        #[arg(long, help = "Skip the evaluation step")]
        no_eval: bool,

        /// Override the configured inter-call delay, in milliseconds
        #[arg(long, help = "Override the configured inter-call delay (ms)")]
        delay_ms: Option<u64>,
    },

    /// Extract themes from a single review given on the command line
    #[command(about = "Extract themes from a single review")]
    Extract {
        /// Review text to analyze
        #[arg(short, long, help = "Review text to analyze")]
        text: String,
    },

    /// Show or update the configuration
    #[command(about = "Show or update the configuration")]
    Config {
        /// Set the endpoint base URL
        #[arg(long, help = "Set the endpoint base URL")]
        base_url: Option<String>,

        /// Set the API key
        #[arg(long, help = "Set the API key")]
        api_key: Option<String>,

        /// Set the model name
        #[arg(long, help = "Set the model name")]
        model: Option<String>,

        /// Set the sampling temperature
        #[arg(long, help = "Set the sampling temperature")]
        temperature: Option<f32>,

        /// Set the completion token limit
        #[arg(long, help = "Set the completion token limit")]
        max_tokens: Option<u32>,

        /// Set the per-call timeout in seconds
        #[arg(long, help = "Set the per-call timeout in seconds")]
        timeout: Option<u64>,

        /// Set the total attempts per call
        #[arg(long, help = "Set the total attempts per call")]
        max_attempts: Option<u32>,

        /// Print the resulting configuration
        #[arg(long, help = "Print the resulting configuration")]
        print: bool,
    },
}

/// Styles for the CLI help output
fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Magenta.on_default().bold())
        .usage(AnsiColor::Cyan.on_default().bold())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Cyan.on_default())
}

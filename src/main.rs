use clap::Parser;
use colored::Colorize;
use theme_extract::cli::{Cli, Commands, DEFAULT_LOG_FILE};
use theme_extract::commands::{self, ConfigArgs, RunArgs};
use theme_extract::logger;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger::init().map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;
    if cli.log || cli.log_file.is_some() {
        let path = cli.log_file.as_deref().unwrap_or(DEFAULT_LOG_FILE);
        logger::set_log_file(path)?;
    }
    logger::set_log_to_stderr(!cli.quiet && std::env::var("THEME_EXTRACT_VERBOSE").is_ok());

    match cli.command {
        Commands::Run {
            input,
            limit,
            all_rows,
            no_eval,
            delay_ms,
        } => {
            commands::handle_run(RunArgs {
                input: &input,
                limit,
                all_rows,
                no_eval,
                delay_ms,
                quiet: cli.quiet,
            })
            .await
        }
        Commands::Extract { text } => commands::handle_extract(&text).await,
        Commands::Config {
            base_url,
            api_key,
            model,
            temperature,
            max_tokens,
            timeout,
            max_attempts,
            print,
        } => commands::handle_config(ConfigArgs {
            base_url,
            api_key,
            model,
            temperature,
            max_tokens,
            timeout,
            max_attempts,
            print,
        }),
    }
}

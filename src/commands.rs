//! Command handlers wiring configuration, dataset, pipeline, and evaluator.

use crate::config::Config;
use crate::dataset::{self, LoadOptions, Review};
use crate::evaluator::Evaluator;
use crate::llm::ThemeExtractor;
use crate::log_info;
use crate::pipeline::Pipeline;
use crate::prompt::ThemePrompt;
use crate::report;
use crate::types::CallOutcome;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::time::Duration;

/// Options for the `run` command.
pub struct RunArgs<'a> {
    pub input: &'a Path,
    pub limit: Option<usize>,
    pub all_rows: bool,
    pub no_eval: bool,
    pub delay_ms: Option<u64>,
    pub quiet: bool,
}

/// Runs extraction over a review file and prints metrics and evaluation.
pub async fn handle_run(args: RunArgs<'_>) -> Result<()> {
    let config = Config::load()?;
    config.validate()?;
    let vocabulary = config.vocabulary();

    let labeled = dataset::load_reviews(
        args.input,
        &vocabulary,
        LoadOptions {
            limit: args.limit,
            require_labels: !args.all_rows,
        },
    )?;

    if !args.quiet {
        println!(
            "Processing {} review(s) with model {}",
            labeled.len().to_string().cyan(),
            config.endpoint.model.cyan()
        );
    }

    let extractor = ThemeExtractor::from_config(&config)?;
    let prompt = ThemePrompt::new(vocabulary.clone());
    let delay = args
        .delay_ms
        .map_or_else(|| config.call_delay(), Duration::from_millis);
    let pipeline = Pipeline::new(extractor, prompt, delay).show_progress(!args.quiet);

    let reviews: Vec<Review> = labeled.iter().map(|row| row.review.clone()).collect();
    let (outcomes, metrics) = pipeline.run(&reviews).await;

    print!("{}", report::format_run_metrics(&metrics));

    if !args.no_eval {
        let pairs: Vec<_> = labeled
            .iter()
            .zip(&outcomes)
            .map(|(row, outcome)| {
                // A failed call scores as an empty prediction
                let prediction = outcome.prediction().cloned().unwrap_or_default();
                (row.ground_truth.clone(), prediction)
            })
            .collect();

        let evaluator = Evaluator::new(vocabulary).exclude_sentinel(config.exclude_sentinel);
        let evaluation = evaluator.evaluate(&pairs);
        print!("{}", report::format_evaluation(&evaluation));
    }

    Ok(())
}

/// Extracts themes from a single review and prints them.
pub async fn handle_extract(text: &str) -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let extractor = ThemeExtractor::from_config(&config)?;
    let prompt = ThemePrompt::new(config.vocabulary());

    log_info!("extracting themes for a single review");
    let outcome = extractor.extract(&prompt.build(text)).await;

    match outcome {
        CallOutcome::Success(prediction) => {
            print!("{}", report::format_prediction(text, &prediction));
        }
        CallOutcome::Failure { kind, message } => {
            eprintln!("{} ({kind}): {message}", "Extraction failed".red().bold());
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Options for the `config` command.
#[derive(Default)]
pub struct ConfigArgs {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout: Option<u64>,
    pub max_attempts: Option<u32>,
    pub print: bool,
}

/// Applies configuration updates and optionally prints the result.
pub fn handle_config(args: ConfigArgs) -> Result<()> {
    let mut config = Config::load()?;
    let mut changed = false;

    if let Some(base_url) = args.base_url {
        config.endpoint.base_url = base_url;
        changed = true;
    }
    if let Some(api_key) = args.api_key {
        config.endpoint.api_key = api_key;
        changed = true;
    }
    if let Some(model) = args.model {
        config.endpoint.model = model;
        changed = true;
    }
    if let Some(temperature) = args.temperature {
        config.endpoint.temperature = temperature;
        changed = true;
    }
    if let Some(max_tokens) = args.max_tokens {
        config.endpoint.max_tokens = max_tokens;
        changed = true;
    }
    if let Some(timeout) = args.timeout {
        config.endpoint.timeout_secs = timeout;
        changed = true;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.retry.max_attempts = max_attempts;
        changed = true;
    }

    if changed {
        config.validate()?;
        config.save()?;
        println!("{}", "Configuration updated".green());
    }

    if args.print || !changed {
        let mut display = config.clone();
        if !display.endpoint.api_key.is_empty() {
            display.endpoint.api_key = "***".to_string();
        }
        println!("{}", toml::to_string_pretty(&display)?);
    }

    Ok(())
}

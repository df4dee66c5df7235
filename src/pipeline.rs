//! Sequential batch orchestration over reviews.
//!
//! Reviews are processed strictly in input order, one at a time, with a
//! configurable pause between calls to respect endpoint rate limits. A
//! failed review is recorded and the run continues; the outcome list is
//! always 1:1 with the input.

use crate::dataset::Review;
use crate::llm::ThemeExtractor;
use crate::prompt::ThemePrompt;
use crate::types::CallOutcome;
use crate::{log_info, log_warn};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

/// Run-level counters, updated as each outcome arrives and never revised.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RunMetrics {
    pub total_reviews: usize,
    pub successes: usize,
    pub failures: usize,
    pub total_themes_extracted: usize,
}

impl RunMetrics {
    fn record(&mut self, outcome: &CallOutcome) {
        self.total_reviews += 1;
        match outcome {
            CallOutcome::Success(prediction) => {
                self.successes += 1;
                self.total_themes_extracted += prediction.len();
            }
            CallOutcome::Failure { .. } => self.failures += 1,
        }
    }

    /// Fraction of reviews that produced a prediction; 0.0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        ratio(self.successes, self.total_reviews)
    }

    /// Mean themes per successful extraction; 0.0 when nothing succeeded.
    pub fn themes_per_success(&self) -> f64 {
        ratio(self.total_themes_extracted, self.successes)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Drives prompt construction and extraction over a batch of reviews.
pub struct Pipeline {
    extractor: ThemeExtractor,
    prompt: ThemePrompt,
    call_delay: Duration,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(extractor: ThemeExtractor, prompt: ThemePrompt, call_delay: Duration) -> Self {
        Self {
            extractor,
            prompt,
            call_delay,
            show_progress: false,
        }
    }

    /// Enables a terminal progress bar over the batch.
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Processes every review in input order and returns one outcome per
    /// review plus the run counters.
    ///
    /// The first call is not delayed; each subsequent call waits
    /// `call_delay`. This method never fails: per-review failures are
    /// captured in the outcome list.
    pub async fn run(&self, reviews: &[Review]) -> (Vec<CallOutcome>, RunMetrics) {
        log_info!("processing batch of {} review(s)", reviews.len());

        let bar = self.progress_bar(reviews.len());
        let mut outcomes = Vec::with_capacity(reviews.len());
        let mut metrics = RunMetrics::default();

        for (index, review) in reviews.iter().enumerate() {
            if index > 0 && !self.call_delay.is_zero() {
                tokio::time::sleep(self.call_delay).await;
            }

            let prompt = self.prompt.build(&review.text);
            let outcome = self.extractor.extract(&prompt).await;

            match &outcome {
                CallOutcome::Success(prediction) => {
                    log_info!("{}: extracted {} theme(s)", review.id, prediction.len());
                }
                CallOutcome::Failure { kind, message } => {
                    log_warn!("{}: {} failure: {}", review.id, kind, message);
                }
            }

            metrics.record(&outcome);
            outcomes.push(outcome);
            bar.inc(1);
        }

        bar.finish_and_clear();
        log_info!(
            "batch complete: {}/{} succeeded",
            metrics.successes,
            metrics.total_reviews
        );

        (outcomes, metrics)
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            bar.set_style(style.progress_chars("##-"));
        }
        bar.set_message("Processing reviews");
        bar
    }
}

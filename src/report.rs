//! Terminal rendering of run metrics and evaluation reports.

use crate::evaluator::EvaluationReport;
use crate::pipeline::RunMetrics;
use crate::types::Prediction;
use colored::Colorize;
use std::fmt::Write;

/// Renders the pipeline counters as a short terminal summary.
pub fn format_run_metrics(metrics: &RunMetrics) -> String {
    let mut out = String::new();

    writeln!(out, "\n{}", "Pipeline Metrics".cyan().bold())
        .expect("write to string should not fail");
    writeln!(out, "{}", "─".repeat(40).dimmed()).expect("write to string should not fail");
    writeln!(out, "  Reviews processed:  {}", metrics.total_reviews)
        .expect("write to string should not fail");
    writeln!(
        out,
        "  Successful calls:   {}",
        metrics.successes.to_string().green()
    )
    .expect("write to string should not fail");
    writeln!(
        out,
        "  Failed calls:       {}",
        metrics.failures.to_string().red()
    )
    .expect("write to string should not fail");
    writeln!(
        out,
        "  Success rate:       {:.1}%",
        metrics.success_rate() * 100.0
    )
    .expect("write to string should not fail");
    writeln!(out, "  Themes extracted:   {}", metrics.total_themes_extracted)
        .expect("write to string should not fail");
    writeln!(
        out,
        "  Themes per success: {:.2}",
        metrics.themes_per_success()
    )
    .expect("write to string should not fail");

    out
}

/// Renders the aggregate evaluation as a terminal summary.
pub fn format_evaluation(report: &EvaluationReport) -> String {
    let mut out = String::new();

    writeln!(out, "\n{}", "Evaluation".cyan().bold()).expect("write to string should not fail");
    writeln!(out, "{}", "─".repeat(40).dimmed()).expect("write to string should not fail");
    writeln!(out, "  Reviews evaluated:    {}", report.review_count())
        .expect("write to string should not fail");
    writeln!(
        out,
        "  Ground-truth themes:  {}",
        report.total_ground_truth_themes
    )
    .expect("write to string should not fail");
    writeln!(
        out,
        "  Predicted themes:     {}",
        report.total_predicted_themes
    )
    .expect("write to string should not fail");
    writeln!(
        out,
        "  Identified:           {} ({:.1}%)",
        report.total_identified.to_string().green(),
        report.identification_rate * 100.0
    )
    .expect("write to string should not fail");
    writeln!(
        out,
        "  Novel:                {} ({:.1}%)",
        report.total_novel.to_string().yellow(),
        report.novel_rate * 100.0
    )
    .expect("write to string should not fail");
    writeln!(
        out,
        "  Themes per review:    {:.2}",
        report.avg_themes_per_review
    )
    .expect("write to string should not fail");

    out
}

/// Renders one prediction next to an excerpt of its review.
pub fn format_prediction(review_text: &str, prediction: &Prediction) -> String {
    let mut out = String::new();

    let excerpt: String = review_text.chars().take(240).collect();
    for line in textwrap::wrap(&excerpt, 78) {
        writeln!(out, "  {}", line.dimmed()).expect("write to string should not fail");
    }

    if prediction.is_empty() {
        writeln!(out, "\n  {}", "No themes identified".yellow())
            .expect("write to string should not fail");
        return out;
    }

    writeln!(
        out,
        "\n  {} theme(s):",
        prediction.len().to_string().green().bold()
    )
    .expect("write to string should not fail");
    for assignment in &prediction.themes {
        writeln!(
            out,
            "  - {}: {}",
            assignment.theme.green(),
            assignment.description
        )
        .expect("write to string should not fail");
    }

    out
}

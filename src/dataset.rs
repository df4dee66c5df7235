//! Review dataset loading.
//!
//! Reads the annotated review CSV (`Comment` and `ProcessedCode` columns)
//! into immutable review records with parsed ground-truth labels.

use crate::evaluator::{GroundTruthLabels, is_absent_marker, parse_ground_truth};
use crate::log_info;
use crate::vocabulary::ThemeVocabulary;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

/// One patient review, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: String,
    pub text: String,
}

/// A review paired with its annotated labels.
#[derive(Debug, Clone)]
pub struct LabeledReview {
    pub review: Review,
    pub ground_truth: GroundTruthLabels,
}

#[derive(Debug, Deserialize)]
struct ReviewRow {
    #[serde(rename = "Comment")]
    comment: String,
    #[serde(rename = "ProcessedCode", default)]
    processed_code: Option<String>,
}

/// Row filtering for [`load_reviews`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Cap on the number of reviews returned
    pub limit: Option<usize>,
    /// Skip rows whose annotation cell is absent or blank
    pub require_labels: bool,
}

/// Loads reviews and their ground-truth labels from a CSV file.
///
/// Rows with a blank comment are always skipped. Row numbers (1-based over
/// kept rows' source positions) become review identifiers.
pub fn load_reviews(
    path: &Path,
    vocabulary: &ThemeVocabulary,
    options: LoadOptions,
) -> Result<Vec<LabeledReview>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open review file '{}'", path.display()))?;

    let mut kept = Vec::new();
    let mut total_rows = 0usize;

    for (index, record) in reader.deserialize::<ReviewRow>().enumerate() {
        total_rows += 1;
        let row = record
            .with_context(|| format!("malformed row {} in '{}'", index + 2, path.display()))?;

        let text = row.comment.trim();
        if text.is_empty() {
            continue;
        }

        let raw_labels = row.processed_code.as_deref().unwrap_or("").trim();
        if options.require_labels && (raw_labels.is_empty() || is_absent_marker(raw_labels)) {
            continue;
        }

        kept.push(LabeledReview {
            review: Review {
                id: format!("r{}", index + 1),
                text: text.to_string(),
            },
            ground_truth: parse_ground_truth(raw_labels, vocabulary),
        });

        if options.limit.is_some_and(|limit| kept.len() >= limit) {
            break;
        }
    }

    if kept.is_empty() {
        bail!(
            "review file '{}' contains no usable reviews",
            path.display()
        );
    }

    log_info!(
        "loaded {} review(s) from '{}' ({} row(s) read)",
        kept.len(),
        path.display(),
        total_rows
    );

    Ok(kept)
}

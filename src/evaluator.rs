//! Evaluation of predicted themes against annotated ground truth.
//!
//! Ground truth arrives as a loosely structured set-literal string (for
//! example `"{'wait_time', 'staff'}"`); predictions arrive as free-text
//! theme names. Both sides are normalized to a canonical form before the
//! set arithmetic, and run-level rates are computed from summed totals, not
//! averaged per-review rates.

use crate::types::Prediction;
use crate::vocabulary::{ThemeVocabulary, UNKNOWN_THEME};
use serde::Serialize;
use std::collections::BTreeSet;

/// Annotated theme names for one review. May be empty.
pub type GroundTruthLabels = BTreeSet<String>;

/// Decodes an annotation cell into labels.
///
/// Accepts a set literal of quoted names; an absent-value marker or any
/// unparseable cell degrades to the empty set. This never fails.
pub fn parse_ground_truth(raw: &str, vocabulary: &ThemeVocabulary) -> GroundTruthLabels {
    let cell = raw.trim();
    if cell.is_empty() || is_absent_marker(cell) {
        return GroundTruthLabels::new();
    }

    let Some(inner) = cell.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) else {
        return GroundTruthLabels::new();
    };

    inner
        .split(',')
        .map(|entry| entry.trim().trim_matches(['\'', '"']).trim())
        .filter(|name| !name.is_empty())
        .map(|name| canonical_name(name, vocabulary))
        .collect()
}

/// Markers meaning "no labels recorded" rather than an empty annotation.
pub(crate) fn is_absent_marker(cell: &str) -> bool {
    let lower = cell.to_lowercase();
    matches!(lower.as_str(), "nan" | "none" | "null" | "set()")
}

/// Canonical comparison form: vocabulary spelling when the name matches a
/// vocabulary entry (case-insensitively), lowercased free text otherwise.
fn canonical_name(name: &str, vocabulary: &ThemeVocabulary) -> String {
    vocabulary
        .canonicalize(name)
        .map_or_else(|| name.to_lowercase(), str::to_string)
}

/// Per-review counts.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReviewScore {
    /// Annotated theme count
    pub ground_truth: usize,
    /// Distinct predicted theme count after normalization
    pub predicted: usize,
    /// Predicted themes present in the ground truth
    pub identified: usize,
    /// Predicted themes absent from the ground truth
    pub novel: usize,
    /// Ground-truth themes the prediction missed
    pub missed: usize,
}

/// Aggregate evaluation across a whole run. Built once, then read-only.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub reviews: Vec<ReviewScore>,
    pub total_ground_truth_themes: usize,
    pub total_predicted_themes: usize,
    pub total_identified: usize,
    pub total_novel: usize,
    /// total_identified / total_ground_truth_themes, 0.0 when no ground truth
    pub identification_rate: f64,
    /// total_novel / total_predicted_themes, 0.0 when nothing was predicted
    pub novel_rate: f64,
    /// total_predicted_themes / review count, 0.0 for an empty run
    pub avg_themes_per_review: f64,
}

impl EvaluationReport {
    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }
}

/// Scores predictions against ground truth.
#[derive(Debug, Clone)]
pub struct Evaluator {
    vocabulary: ThemeVocabulary,
    exclude_sentinel: bool,
}

impl Evaluator {
    pub fn new(vocabulary: ThemeVocabulary) -> Self {
        Self {
            vocabulary,
            exclude_sentinel: false,
        }
    }

    /// Drops the "unknown" sentinel from predictions before scoring. Off by
    /// default: the sentinel counts as a normal predicted theme.
    pub fn exclude_sentinel(mut self, enabled: bool) -> Self {
        self.exclude_sentinel = enabled;
        self
    }

    /// Scores every (ground truth, prediction) pair and aggregates by
    /// summation. Never fails; zero denominators yield 0.0 rates.
    ///
    /// A pair whose prediction is empty (including one substituted for a
    /// failed call) contributes nothing to the predicted or identified
    /// totals, and its whole ground-truth set counts as missed.
    pub fn evaluate(&self, pairs: &[(GroundTruthLabels, Prediction)]) -> EvaluationReport {
        let mut reviews = Vec::with_capacity(pairs.len());
        let mut total_ground_truth = 0;
        let mut total_predicted = 0;
        let mut total_identified = 0;
        let mut total_novel = 0;

        for (truth, prediction) in pairs {
            let truth = self.normalized(truth.iter().map(String::as_str));
            let predicted = self.predicted_set(prediction);

            let identified = truth.intersection(&predicted).count();
            let novel = predicted.difference(&truth).count();
            let missed = truth.len() - identified;

            total_ground_truth += truth.len();
            total_predicted += predicted.len();
            total_identified += identified;
            total_novel += novel;

            reviews.push(ReviewScore {
                ground_truth: truth.len(),
                predicted: predicted.len(),
                identified,
                novel,
                missed,
            });
        }

        let review_count = reviews.len();
        EvaluationReport {
            reviews,
            total_ground_truth_themes: total_ground_truth,
            total_predicted_themes: total_predicted,
            total_identified,
            total_novel,
            identification_rate: ratio(total_identified, total_ground_truth),
            novel_rate: ratio(total_novel, total_predicted),
            avg_themes_per_review: ratio(total_predicted, review_count),
        }
    }

    /// Distinct normalized theme names from a prediction. Duplicates that
    /// differ only in case or whitespace collapse to one entry.
    fn predicted_set(&self, prediction: &Prediction) -> BTreeSet<String> {
        let names = prediction
            .theme_names()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let mut set = self.normalized(names);
        if self.exclude_sentinel {
            set.remove(UNKNOWN_THEME);
        }
        set
    }

    fn normalized<'a>(&self, names: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
        names
            .map(|name| canonical_name(name.trim(), &self.vocabulary))
            .collect()
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

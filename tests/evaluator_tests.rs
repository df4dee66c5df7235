use std::collections::BTreeSet;
use theme_extract::evaluator::{Evaluator, GroundTruthLabels, parse_ground_truth};
use theme_extract::types::{Prediction, ThemeAssignment};
use theme_extract::vocabulary::ThemeVocabulary;

fn labels(names: &[&str]) -> GroundTruthLabels {
    names.iter().map(|name| (*name).to_string()).collect()
}

fn prediction(names: &[&str]) -> Prediction {
    Prediction {
        themes: names
            .iter()
            .map(|name| ThemeAssignment {
                theme: (*name).to_string(),
                description: String::new(),
            })
            .collect(),
    }
}

#[test]
fn parses_set_literal_ground_truth() {
    let vocabulary = ThemeVocabulary::default();
    let parsed = parse_ground_truth("{'wait_time', 'staff'}", &vocabulary);
    assert_eq!(parsed, labels(&["staff", "wait_time"]));
}

#[test]
fn parses_double_quoted_entries() {
    let vocabulary = ThemeVocabulary::default();
    let parsed = parse_ground_truth(r#"{"billing", "cleanliness"}"#, &vocabulary);
    assert_eq!(parsed, labels(&["billing", "cleanliness"]));
}

#[test]
fn absent_markers_yield_empty_sets() {
    let vocabulary = ThemeVocabulary::default();
    for marker in ["", "   ", "nan", "NaN", "None", "null", "set()"] {
        let parsed = parse_ground_truth(marker, &vocabulary);
        assert!(parsed.is_empty(), "marker {marker:?} should parse to empty");
    }
}

#[test]
fn unparseable_cells_degrade_to_empty_sets() {
    let vocabulary = ThemeVocabulary::default();
    for garbage in ["staff, wait_time", "{'unclosed'", "[1, 2]", "{{}}{"] {
        let parsed = parse_ground_truth(garbage, &vocabulary);
        assert!(
            parsed.is_empty(),
            "garbage {garbage:?} should parse to empty"
        );
    }
}

#[test]
fn ground_truth_names_are_case_normalized_against_the_vocabulary() {
    let vocabulary = ThemeVocabulary::default();
    let parsed = parse_ground_truth("{'Staff', ' WAIT_TIME '}", &vocabulary);
    assert_eq!(parsed, labels(&["staff", "wait_time"]));
}

#[test]
fn identified_novel_and_missed_counts() {
    let evaluator = Evaluator::new(ThemeVocabulary::default());
    let pairs = vec![(
        labels(&["staff", "wait_time"]),
        prediction(&["staff", "cleanliness"]),
    )];

    let report = evaluator.evaluate(&pairs);

    assert_eq!(report.reviews[0].identified, 1);
    assert_eq!(report.reviews[0].novel, 1);
    assert_eq!(report.reviews[0].missed, 1);
}

#[test]
fn all_empty_ground_truth_guards_the_denominator() {
    let evaluator = Evaluator::new(ThemeVocabulary::default());
    let pairs = vec![
        (BTreeSet::new(), prediction(&["staff"])),
        (BTreeSet::new(), prediction(&[])),
    ];

    let report = evaluator.evaluate(&pairs);

    assert_eq!(report.total_ground_truth_themes, 0);
    assert!((report.identification_rate - 0.0).abs() < f64::EPSILON);
    // Predictions against empty ground truth are all novel
    assert_eq!(report.total_novel, 1);
    assert!((report.novel_rate - 1.0).abs() < f64::EPSILON);
}

#[test]
fn duplicate_predictions_differing_in_case_count_once() {
    let evaluator = Evaluator::new(ThemeVocabulary::default());
    let pairs = vec![(labels(&["staff"]), prediction(&["Staff ", "staff"]))];

    let report = evaluator.evaluate(&pairs);

    assert_eq!(report.total_predicted_themes, 1);
    assert_eq!(report.total_identified, 1);
    assert_eq!(report.total_novel, 0);
}

#[test]
fn failed_calls_count_their_ground_truth_as_missed() {
    let evaluator = Evaluator::new(ThemeVocabulary::default());
    // A failure outcome is substituted with an empty prediction upstream
    let pairs = vec![
        (labels(&["staff", "billing"]), Prediction::default()),
        (labels(&["wait_time"]), Prediction::default()),
    ];

    let report = evaluator.evaluate(&pairs);

    assert_eq!(report.total_ground_truth_themes, 3);
    assert_eq!(report.total_predicted_themes, 0);
    assert_eq!(report.total_identified, 0);
    assert!((report.identification_rate - 0.0).abs() < f64::EPSILON);
    assert!((report.novel_rate - 0.0).abs() < f64::EPSILON);
    let missed: usize = report.reviews.iter().map(|score| score.missed).sum();
    assert_eq!(missed, 3);
}

#[test]
fn sentinel_counts_as_a_normal_predicted_theme_by_default() {
    let evaluator = Evaluator::new(ThemeVocabulary::default());
    let pairs = vec![
        (labels(&["staff"]), prediction(&["staff", "unknown"])),
        (BTreeSet::new(), prediction(&["billing"])),
    ];

    let report = evaluator.evaluate(&pairs);

    assert_eq!(report.total_predicted_themes, 3);
    assert_eq!(report.total_identified, 1);
    assert_eq!(report.total_novel, 2);
    assert!((report.identification_rate - 1.0).abs() < f64::EPSILON);
    assert!((report.novel_rate - 2.0 / 3.0).abs() < 1e-9);
    assert!((report.avg_themes_per_review - 1.5).abs() < f64::EPSILON);
}

#[test]
fn sentinel_can_be_excluded_from_scoring() {
    let evaluator = Evaluator::new(ThemeVocabulary::default()).exclude_sentinel(true);
    let pairs = vec![(labels(&["staff"]), prediction(&["staff", "unknown"]))];

    let report = evaluator.evaluate(&pairs);

    assert_eq!(report.total_predicted_themes, 1);
    assert_eq!(report.total_novel, 0);
}

#[test]
fn rates_use_summation_not_per_review_averaging() {
    let evaluator = Evaluator::new(ThemeVocabulary::default());
    // Review 1: 4 ground-truth themes, 1 identified. Review 2: 1 of 1.
    // Summation gives 2/5; averaging per-review rates would give 0.625.
    let pairs = vec![
        (
            labels(&["staff", "billing", "wait_time", "cleanliness"]),
            prediction(&["staff"]),
        ),
        (labels(&["medication"]), prediction(&["medication"])),
    ];

    let report = evaluator.evaluate(&pairs);

    assert_eq!(report.total_ground_truth_themes, 5);
    assert_eq!(report.total_identified, 2);
    assert!((report.identification_rate - 0.4).abs() < 1e-9);
}

#[test]
fn empty_run_produces_zeroed_report() {
    let evaluator = Evaluator::new(ThemeVocabulary::default());
    let report = evaluator.evaluate(&[]);

    assert_eq!(report.review_count(), 0);
    assert!((report.identification_rate - 0.0).abs() < f64::EPSILON);
    assert!((report.novel_rate - 0.0).abs() < f64::EPSILON);
    assert!((report.avg_themes_per_review - 0.0).abs() < f64::EPSILON);
}

#[test]
fn free_text_predictions_fold_to_lowercase() {
    let evaluator = Evaluator::new(ThemeVocabulary::default());
    // "Insurance" is not in the vocabulary; both spellings collapse
    let pairs = vec![(labels(&["staff"]), prediction(&["Insurance", "insurance"]))];

    let report = evaluator.evaluate(&pairs);

    assert_eq!(report.total_predicted_themes, 1);
    assert_eq!(report.total_novel, 1);
}

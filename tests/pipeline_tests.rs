use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use theme_extract::dataset::Review;
use theme_extract::evaluator::Evaluator;
use theme_extract::llm::{CompletionBackend, ExtractionError, RetryPolicy, ThemeExtractor};
use theme_extract::pipeline::Pipeline;
use theme_extract::prompt::ThemePrompt;
use theme_extract::types::Prediction;
use theme_extract::vocabulary::ThemeVocabulary;

/// Backend that records every prompt and answers from a fixed script.
struct RecordingBackend {
    prompts: Mutex<Vec<String>>,
    responses: Mutex<Vec<Result<String, ExtractionError>>>,
}

impl RecordingBackend {
    fn new(responses: Vec<Result<String, ExtractionError>>) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            responses: Mutex::new(responses),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .expect("prompts lock should not be poisoned")
            .clone()
    }
}

/// Local newtype so the foreign `CompletionBackend` trait is implemented on a
/// crate-local type (orphan rule), while still sharing state with the test.
struct SharedBackend(Arc<RecordingBackend>);

#[async_trait]
impl CompletionBackend for SharedBackend {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractionError> {
        self.0
            .prompts
            .lock()
            .expect("prompts lock should not be poisoned")
            .push(prompt.to_string());
        self.0
            .responses
            .lock()
            .expect("responses lock should not be poisoned")
            .remove(0)
    }
}

fn reviews(count: usize) -> Vec<Review> {
    (1..=count)
        .map(|n| Review {
            id: format!("r{n}"),
            text: format!("review-text-{n}"),
        })
        .collect()
}

fn pipeline_over(responses: Vec<Result<String, ExtractionError>>) -> (Arc<RecordingBackend>, Pipeline) {
    let backend = Arc::new(RecordingBackend::new(responses));
    let extractor = ThemeExtractor::new(
        Box::new(SharedBackend(Arc::clone(&backend))),
        RetryPolicy::immediate(1),
    );
    let pipeline = Pipeline::new(
        extractor,
        ThemePrompt::new(ThemeVocabulary::default()),
        Duration::ZERO,
    );
    (backend, pipeline)
}

fn success_body(theme: &str) -> Result<String, ExtractionError> {
    Ok(format!(
        r#"{{"themes": [{{"theme": "{theme}", "description": ""}}]}}"#
    ))
}

#[tokio::test]
async fn processes_reviews_in_input_order() {
    let (backend, pipeline) = pipeline_over(vec![
        success_body("staff"),
        success_body("billing"),
        success_body("wait_time"),
    ]);

    let batch = reviews(3);
    let (outcomes, metrics) = pipeline.run(&batch).await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(metrics.successes, 3);

    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 3);
    for (prompt, review) in prompts.iter().zip(&batch) {
        assert!(
            prompt.contains(&review.text),
            "prompt order must match input order"
        );
    }
}

#[tokio::test]
async fn a_failed_review_does_not_abort_the_run() {
    let (_, pipeline) = pipeline_over(vec![
        success_body("staff"),
        Err(ExtractionError::Transport("connection reset".to_string())),
        success_body("billing"),
    ]);

    let batch = reviews(3);
    let (outcomes, metrics) = pipeline.run(&batch).await;

    assert_eq!(outcomes.len(), 3, "one outcome per input review");
    assert!(outcomes[0].is_success());
    assert!(!outcomes[1].is_success());
    assert!(outcomes[2].is_success());
    assert_eq!(metrics.successes, 2);
    assert_eq!(metrics.failures, 1);
    assert_eq!(metrics.total_reviews, 3);
}

#[tokio::test]
async fn all_failures_zero_the_success_rate_and_miss_everything() {
    let failures: Vec<_> = (0..3)
        .map(|_| Err(ExtractionError::Transport("down".to_string())))
        .collect();
    let (_, pipeline) = pipeline_over(failures);

    let batch = reviews(3);
    let (outcomes, metrics) = pipeline.run(&batch).await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(metrics.failures, 3);
    assert!((metrics.success_rate() - 0.0).abs() < f64::EPSILON);

    // Every ground-truth theme of a failed review scores as missed
    let ground_truth: Vec<theme_extract::evaluator::GroundTruthLabels> = ["staff", "billing", "wait_time"]
        .iter()
        .map(|name| std::iter::once((*name).to_string()).collect())
        .collect();
    let pairs: Vec<_> = ground_truth
        .into_iter()
        .zip(&outcomes)
        .map(|(truth, outcome)| {
            let prediction = outcome.prediction().cloned().unwrap_or_default();
            (truth, prediction)
        })
        .collect();

    let report = Evaluator::new(ThemeVocabulary::default()).evaluate(&pairs);
    assert_eq!(report.total_ground_truth_themes, 3);
    assert_eq!(report.total_identified, 0);
    let missed: usize = report.reviews.iter().map(|score| score.missed).sum();
    assert_eq!(missed, 3);
}

#[tokio::test]
async fn empty_batch_produces_empty_outcomes() {
    let (_, pipeline) = pipeline_over(Vec::new());

    let (outcomes, metrics) = pipeline.run(&[]).await;

    assert!(outcomes.is_empty());
    assert_eq!(metrics.total_reviews, 0);
    assert!((metrics.success_rate() - 0.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn metrics_count_extracted_themes() {
    let (_, pipeline) = pipeline_over(vec![
        Ok(r#"{"themes": [{"theme": "staff", "description": ""}, {"theme": "billing", "description": ""}]}"#.to_string()),
        Ok(r#"{"themes": []}"#.to_string()),
    ]);

    let (_, metrics) = pipeline.run(&reviews(2)).await;

    assert_eq!(metrics.successes, 2, "empty prediction is still a success");
    assert_eq!(metrics.total_themes_extracted, 2);
    assert!((metrics.themes_per_success() - 1.0).abs() < f64::EPSILON);
}

/// End-to-end scenario over the public API: two reviews, one with ground
/// truth {staff} answered with [staff, unknown], one without ground truth
/// answered with [billing].
#[tokio::test]
async fn end_to_end_identification_and_novelty() {
    let (_, pipeline) = pipeline_over(vec![
        Ok(r#"{"themes": [{"theme": "staff", "description": ""}, {"theme": "unknown", "description": ""}]}"#.to_string()),
        success_body("billing"),
    ]);

    let batch = reviews(2);
    let (outcomes, _) = pipeline.run(&batch).await;

    let ground_truth = [
        std::iter::once("staff".to_string()).collect(),
        std::collections::BTreeSet::new(),
    ];
    let pairs: Vec<_> = ground_truth
        .into_iter()
        .zip(&outcomes)
        .map(|(truth, outcome)| {
            let prediction: Prediction = outcome.prediction().cloned().unwrap_or_default();
            (truth, prediction)
        })
        .collect();

    let report = Evaluator::new(ThemeVocabulary::default()).evaluate(&pairs);

    assert_eq!(report.total_predicted_themes, 3);
    assert_eq!(report.total_identified, 1);
    assert_eq!(report.total_novel, 2);
    assert!((report.identification_rate - 1.0).abs() < f64::EPSILON);
    assert!((report.novel_rate - 1.0 / 3.0).abs() < 1e-9);
    assert!((report.avg_themes_per_review - 1.5).abs() < f64::EPSILON);
}

//! theme-extract: LLM-backed theme extraction and evaluation
//!
//! This library extracts thematic labels from free-text patient reviews via an
//! OpenAI-compatible completion endpoint and scores the predictions against
//! human-annotated ground truth.

pub mod cli;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod evaluator;
pub mod llm;
pub mod logger;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod response;
pub mod types;
pub mod vocabulary;

// Re-export important structs and functions for easier testing
pub use config::Config;
pub use dataset::{LabeledReview, LoadOptions, Review};
pub use evaluator::{EvaluationReport, Evaluator, GroundTruthLabels, parse_ground_truth};
pub use llm::{
    ChatCompletionsBackend, CompletionBackend, ExtractionError, RetryPolicy, ThemeExtractor,
};
pub use pipeline::{Pipeline, RunMetrics};
pub use prompt::ThemePrompt;
pub use response::{parse_prediction, parse_structured};
pub use types::{CallOutcome, FailureKind, Prediction, ThemeAssignment};
pub use vocabulary::{DEFAULT_THEMES, ThemeVocabulary, UNKNOWN_THEME};

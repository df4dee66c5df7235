//! Structured prediction and call-outcome types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One theme the model assigned to a review.
///
/// The theme name is free text from the model and is not guaranteed to match
/// the vocabulary verbatim; normalization happens at evaluation time.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct ThemeAssignment {
    /// Theme name as the model wrote it
    pub theme: String,
    /// Short justification for why the theme applies
    #[serde(default)]
    pub description: String,
}

/// Structured prediction for a single review: the `{"themes": [...]}` payload.
///
/// An empty list is a valid "no theme identified" result.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Default, PartialEq, Eq)]
pub struct Prediction {
    /// Themes in the order the model emitted them
    pub themes: Vec<ThemeAssignment>,
}

impl Prediction {
    /// Theme names in emission order, duplicates included.
    pub fn theme_names(&self) -> impl Iterator<Item = &str> {
        self.themes.iter().map(|assignment| assignment.theme.as_str())
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }
}

/// Failure classes for one LLM invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Network, timeout, or server-side error; the call was retried.
    Transport,
    /// The endpoint rejected the request; retrying cannot help.
    Request,
    /// The response body did not conform to the themes payload schema.
    Parse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Transport => "transport",
            Self::Request => "request",
            Self::Parse => "parse",
        };
        f.write_str(label)
    }
}

/// Result of one LLM invocation.
///
/// Failures are data, not control flow: the orchestrator records them and
/// moves on to the next review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Success(Prediction),
    Failure { kind: FailureKind, message: String },
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The prediction, if the call succeeded.
    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            Self::Success(prediction) => Some(prediction),
            Self::Failure { .. } => None,
        }
    }

    /// The failure kind, if the call failed.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

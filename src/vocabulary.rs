//! Theme vocabulary.
//!
//! Single source of truth for the canonical theme names a run scores against.

use serde::{Deserialize, Serialize};

/// Sentinel the model is told to emit when no vocabulary theme matches.
pub const UNKNOWN_THEME: &str = "unknown";

/// Built-in vocabulary for patient-review categorization.
pub const DEFAULT_THEMES: &[&str] = &[
    "appointment_scheduling",
    "bedside_manner",
    "billing",
    "cleanliness",
    "communication",
    "facilities",
    "follow_up",
    "medication",
    "parking",
    "staff",
    "treatment_quality",
    "wait_time",
];

/// Ordered set of canonical theme names, fixed for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeVocabulary {
    themes: Vec<String>,
}

impl ThemeVocabulary {
    /// Builds a vocabulary from the given names, trimming whitespace and
    /// dropping duplicates while preserving first-seen order.
    pub fn new<I, S>(themes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: Vec<String> = Vec::new();
        for theme in themes {
            let name = theme.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if !seen.iter().any(|known| known.eq_ignore_ascii_case(name)) {
                seen.push(name.to_string());
            }
        }
        Self { themes: seen }
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, name: &str) -> bool {
        self.canonicalize(name).is_some()
    }

    /// Resolves a free-text name to its canonical spelling, if it matches.
    pub fn canonicalize(&self, name: &str) -> Option<&str> {
        let wanted = name.trim();
        self.themes
            .iter()
            .find(|theme| theme.eq_ignore_ascii_case(wanted))
            .map(String::as_str)
    }

    /// Canonical names in vocabulary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    /// Comma-separated list for prompt interpolation.
    pub fn prompt_list(&self) -> String {
        self.themes.join(", ")
    }
}

impl Default for ThemeVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_THEMES.iter().copied())
    }
}

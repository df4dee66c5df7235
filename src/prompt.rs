//! Prompt construction for theme extraction.

use crate::vocabulary::{ThemeVocabulary, UNKNOWN_THEME};

/// Wraps a patient review in the fixed theme-extraction instruction template.
#[derive(Debug, Clone)]
pub struct ThemePrompt {
    vocabulary: ThemeVocabulary,
}

impl ThemePrompt {
    pub fn new(vocabulary: ThemeVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &ThemeVocabulary {
        &self.vocabulary
    }

    /// Produces the full prompt for one review.
    pub fn build(&self, review: &str) -> String {
        format!(
            "You are analyzing a patient review to identify key themes or areas discussed in the text. \
             Key themes are specific topics, concerns, or aspects of the healthcare experience that the patient \
             mentions or talks about in their review.\n\n\
             Analyze the following patient review and identify all key themes from this list: {themes}.\n\n\
             Instructions:\n\
             - Identify themes that represent topics, concerns, or areas explicitly mentioned or discussed in the review\n\
             - A single review may contain multiple themes\n\
             - Match themes based on the content and context of what the patient is describing\n\
             - If no theme from the list matches the content, use '{unknown}'\n\
             - For each identified theme, provide a brief description explaining why this theme applies\n\n\
             Patient Review:\n{review}\n\n\
             Respond with a JSON object containing a list of identified themes in the format below:\n\
             {{\n\
             \x20 \"themes\": [\n\
             \x20   {{\n\
             \x20     \"theme\": \"\",\n\
             \x20     \"description\": \"\"\n\
             \x20   }}\n\
             \x20 ]\n\
             }}",
            themes = self.vocabulary.prompt_list(),
            unknown = UNKNOWN_THEME,
        )
    }
}

impl Default for ThemePrompt {
    fn default() -> Self {
        Self::new(ThemeVocabulary::default())
    }
}

//! Recovery and validation of model responses.
//!
//! Models frequently wrap the themes payload in prose or markdown fences, so
//! decoding runs a fallback chain: direct parse, then extraction from a
//! ```json block, then the first balanced-brace substring. Whatever survives
//! is validated against the payload schema.

use crate::llm::ExtractionError;
use crate::types::Prediction;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

/// Decodes a raw completion into a [`Prediction`].
///
/// An empty `themes` list is a valid result. A payload that is missing the
/// `themes` key, carries a non-list value, or contains an entry without a
/// theme name fails with [`ExtractionError::Parse`].
pub fn parse_prediction(raw: &str) -> Result<Prediction, ExtractionError> {
    validate(parse_structured(raw)?)
}

/// Decodes a raw completion into any schema-described output type, running
/// the recovery chain when the body is not pure JSON.
pub fn parse_structured<T>(raw: &str) -> Result<T, ExtractionError>
where
    T: DeserializeOwned + JsonSchema,
{
    let text = raw.trim();

    if let Ok(parsed) = serde_json::from_str::<T>(text) {
        return Ok(parsed);
    }

    if let Some(block) = extract_from_markdown(text)
        && let Ok(parsed) = serde_json::from_str::<T>(&block)
    {
        return Ok(parsed);
    }

    if let Some(candidate) = extract_json_object(text)
        && let Ok(parsed) = serde_json::from_str::<T>(&candidate)
    {
        return Ok(parsed);
    }

    Err(ExtractionError::Parse(format!(
        "no structured payload in response: {}",
        preview(text)
    )))
}

fn validate(prediction: Prediction) -> Result<Prediction, ExtractionError> {
    if prediction
        .themes
        .iter()
        .any(|assignment| assignment.theme.trim().is_empty())
    {
        return Err(ExtractionError::Parse(
            "themes payload contains an entry without a theme name".to_string(),
        ));
    }
    Ok(prediction)
}

/// Pulls the contents of the first ```json fence, if one is present.
fn extract_from_markdown(text: &str) -> Option<String> {
    let fence_start = text.find("```json")?;
    let content_start = fence_start + "```json".len();
    let fence_end = text[content_start..].find("```")?;
    Some(text[content_start..content_start + fence_end].trim().to_string())
}

/// Finds the first balanced-brace substring.
///
/// Balance is tracked outside string literals so braces inside theme
/// descriptions do not end the object early.
fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..=start + offset].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 200;
    if text.chars().count() <= LIMIT {
        text.to_string()
    } else {
        let head: String = text.chars().take(LIMIT).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_payload() {
        let raw = r#"{"themes": [{"theme": "staff", "description": "friendly nurses"}]}"#;
        let prediction = parse_prediction(raw).expect("clean payload should parse");
        assert_eq!(prediction.themes.len(), 1);
        assert_eq!(prediction.themes[0].theme, "staff");
    }

    #[test]
    fn parses_markdown_fenced_payload() {
        let raw = "Here you go:\n```json\n{\"themes\": [{\"theme\": \"billing\", \"description\": \"\"}]}\n```\nHope that helps!";
        let prediction = parse_prediction(raw).expect("fenced payload should parse");
        assert_eq!(prediction.themes[0].theme, "billing");
    }

    #[test]
    fn recovers_payload_embedded_in_prose() {
        let raw = "Sure! The themes are {\"themes\": [{\"theme\": \"wait_time\", \"description\": \"long {2 hour} wait\"}]} as requested.";
        let prediction = parse_prediction(raw).expect("embedded payload should parse");
        assert_eq!(prediction.themes[0].theme, "wait_time");
        assert_eq!(prediction.themes[0].description, "long {2 hour} wait");
    }

    #[test]
    fn empty_theme_list_is_valid() {
        let prediction = parse_prediction(r#"{"themes": []}"#).expect("empty list is valid");
        assert!(prediction.is_empty());
    }

    #[test]
    fn missing_themes_key_fails() {
        let err = parse_prediction(r#"{"labels": []}"#).expect_err("missing key must fail");
        assert!(matches!(err, ExtractionError::Parse(_)));
    }

    #[test]
    fn non_list_themes_value_fails() {
        let err = parse_prediction(r#"{"themes": "staff"}"#).expect_err("non-list must fail");
        assert!(matches!(err, ExtractionError::Parse(_)));
    }

    #[test]
    fn entry_without_theme_name_fails() {
        let err = parse_prediction(r#"{"themes": [{"description": "no name"}]}"#)
            .expect_err("nameless entry must fail");
        assert!(matches!(err, ExtractionError::Parse(_)));

        let err = parse_prediction(r#"{"themes": [{"theme": "  ", "description": "blank"}]}"#)
            .expect_err("blank name must fail");
        assert!(matches!(err, ExtractionError::Parse(_)));
    }

    #[test]
    fn missing_description_defaults_to_empty() {
        let prediction = parse_prediction(r#"{"themes": [{"theme": "staff"}]}"#)
            .expect("description is optional");
        assert_eq!(prediction.themes[0].description, "");
    }

    #[test]
    fn parsing_is_idempotent() {
        let raw = r#"{"themes": [{"theme": "staff", "description": "x"}, {"theme": "billing", "description": "y"}]}"#;
        let first = parse_prediction(raw).expect("first parse");
        let second = parse_prediction(raw).expect("second parse");
        assert_eq!(first, second);
    }

    #[test]
    fn plain_prose_fails() {
        let err = parse_prediction("I could not find any themes.").expect_err("prose must fail");
        assert!(matches!(err, ExtractionError::Parse(_)));
    }
}

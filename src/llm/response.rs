use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Failure to recover a JSON object from model output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("No JSON object found in model response.")]
    NoJsonObject,
}

static LEADING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[a-zA-Z]*").expect("valid fence regex"));

/// Extract the last JSON object embedded in a model response.
///
/// Code fences are stripped first. Every `{` is tried as the start of a JSON
/// value; a decode failure moves on by one character, a success resumes after
/// the decoded value. Models sometimes emit a draft object before a corrected
/// one, so the last object wins.
pub fn extract_json_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    let mut cleaned = text.trim().to_string();
    if cleaned.starts_with("```") {
        cleaned = LEADING_FENCE.replace(&cleaned, "").replace("```", "");
    }

    let mut idx = 0;
    let mut last_obj = None;
    while let Some(offset) = cleaned[idx..].find('{') {
        let start = idx + offset;
        let mut stream = serde_json::Deserializer::from_str(&cleaned[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                if let Value::Object(object) = value {
                    last_obj = Some(object);
                }
                idx = start + stream.byte_offset();
            }
            _ => idx = start + 1,
        }
    }

    last_obj.ok_or(ParseError::NoJsonObject)
}

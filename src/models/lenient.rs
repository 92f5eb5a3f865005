//! Coercion helpers for loosely-typed JSON coming from model output and
//! hand-edited artifacts.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Render a JSON value as trimmed text.
///
/// `null` becomes the empty string, strings are trimmed, and any other value
/// uses its compact JSON rendering.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Read `key` from an object as trimmed text (empty when absent).
pub fn text_field(object: &serde_json::Map<String, Value>, key: &str) -> String {
    object.get(key).map(value_to_text).unwrap_or_default()
}

/// Coerce a JSON value to an integer.
///
/// Integers pass through, floats truncate toward zero, strings must parse as
/// an integer after trimming, booleans map to 0/1. Everything else fails.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| u.min(i64::MAX as u64) as i64))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// serde adapter: any JSON value as trimmed text.
pub fn de_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

/// serde adapter: any numeric-like value as a non-negative integer, 0 on failure.
pub fn de_start_time<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_int(&value).unwrap_or(0).max(0) as u64)
}

/// serde adapter: a list of trimmed non-empty strings; non-lists become empty.
pub fn de_text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(text_list(&value))
}

/// Trimmed, whitespace-collapsed, non-empty strings from a JSON list.
pub fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| collapse_whitespace(&value_to_text(item)))
            .filter(|item| !item.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

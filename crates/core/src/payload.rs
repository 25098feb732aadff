//! Normalization of webhook and storage payloads into domain records.
//!
//! The history endpoint has answered with a bare array, an object wrapping the
//! array in `data`, and occasionally something else entirely. Records inside
//! may carry `null` or non-array `phrases`. Everything here degrades to empty
//! values instead of failing.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::ExtractionRecord;

/// Turns a decoded history response into records.
///
/// Accepts `[...]` or `{"data": [...]}`. Any other shape yields an empty list.
/// Array items that are not objects are skipped.
pub fn records_from_value(value: Value) -> Vec<ExtractionRecord> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                warn!("history payload is an object without a `data` array");
                return Vec::new();
            }
        },
        other => {
            warn!(kind = value_kind(&other), "unexpected history payload");
            return Vec::new();
        }
    };

    let total = items.len();
    let records: Vec<ExtractionRecord> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(_) => ExtractionRecord::deserialize(item).ok(),
            _ => None,
        })
        .collect();

    if records.len() != total {
        debug!(skipped = total - records.len(), "skipped malformed history items");
    }
    records
}

/// Decodes raw response bytes; invalid JSON yields an empty list.
pub fn records_from_slice(bytes: &[u8]) -> Vec<ExtractionRecord> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => records_from_value(value),
        Err(e) => {
            warn!(error = %e, "history payload is not valid JSON");
            Vec::new()
        }
    }
}

/// Keeps the string items of a `phrases` value. Anything that is not an array
/// contributes nothing.
pub fn normalize_phrases(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Phrases stored as JSON text, as in a database column. Invalid JSON or a
/// non-array value yields no phrases.
pub fn phrases_from_json_text(text: &str) -> Vec<String> {
    serde_json::from_str::<Value>(text).map(normalize_phrases).unwrap_or_default()
}

/// Phrases from an extraction response body (`{"phrases": [...]}`).
pub fn phrases_from_response(value: Value) -> Vec<String> {
    match value {
        Value::Object(mut map) => map.remove("phrases").map(normalize_phrases).unwrap_or_default(),
        _ => Vec::new(),
    }
}

pub(crate) fn lenient_phrases<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(normalize_phrases(Value::deserialize(deserializer)?))
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Wire types for the stats and events endpoints.
//!
//! The upstream service is not strict about types, so decoding here is
//! deliberately forgiving: a field of the wrong type degrades to a string
//! or to absent, and one bad event never rejects the whole payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::FetchError;
use crate::data::signature::canonical_json;

/// One event as delivered by the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Start timestamp, in any of the formats the normalizer accepts.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// End timestamp.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,

    /// Any other keys, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Body of `GET /stats`.
///
/// Metric keys stay as raw JSON in `fields`; [`crate::data::reconcile`]
/// decides which ones count.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatsPayload {
    #[serde(default, deserialize_with = "lenient_events")]
    pub events: Vec<RawEvent>,

    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

/// Coerce any JSON value into an optional string.
///
/// Strings pass through, numbers and booleans use their JSON spelling,
/// objects and arrays become canonical JSON text, `null` is absent.
pub fn coerce_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(canonical_json(&other)),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_string(Value::deserialize(deserializer)?))
}

fn lenient_events<'de, D>(deserializer: D) -> Result<Vec<RawEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(events_from_value(Value::deserialize(deserializer)?))
}

/// Decode an array of events, skipping entries that are not objects.
fn events_from_value(value: Value) -> Vec<RawEvent> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Decode the body of `GET /events?date=…`.
///
/// Accepts `{"events": [...]}`, `{"data": [...]}` or a bare array. Any other
/// shape is a parse error so that the caller can fall back.
pub fn parse_day_events(body: Value) -> Result<Vec<RawEvent>, FetchError> {
    match body {
        Value::Array(_) => Ok(events_from_value(body)),
        Value::Object(mut map) => {
            let list = map
                .remove("events")
                .filter(Value::is_array)
                .or_else(|| map.remove("data").filter(Value::is_array));
            match list {
                Some(list) => Ok(events_from_value(list)),
                None => Err(FetchError::Parse(
                    "expected an `events` or `data` array".to_string(),
                )),
            }
        }
        other => Err(FetchError::Parse(format!(
            "unexpected day payload: {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

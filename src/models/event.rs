//! Inbound trigger payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw trigger parameters.
///
/// Fields are kept as untyped JSON so that a wrong type can be reported as
/// such instead of failing deserialization of the whole event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerEvent {
    #[serde(default)]
    pub date_from: Option<Value>,

    #[serde(default)]
    pub search_term: Option<Value>,

    #[serde(default)]
    pub stream_id: Option<Value>,
}

impl TriggerEvent {
    /// Build from string parameters.
    pub fn new(
        date_from: impl Into<String>,
        search_term: impl Into<String>,
        stream_id: impl Into<String>,
    ) -> Self {
        Self {
            date_from: Some(Value::String(date_from.into())),
            search_term: Some(Value::String(search_term.into())),
            stream_id: Some(Value::String(stream_id.into())),
        }
    }

    /// Pick the known fields out of an arbitrary payload.
    ///
    /// A payload that is not an object yields an event with every field
    /// missing.
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            date_from: payload.get("date_from").cloned(),
            search_term: payload.get("search_term").cloned(),
            stream_id: payload.get("stream_id").cloned(),
        }
    }

    /// Stream id as given, for log output when validation never got that far.
    pub fn stream_id_hint(&self) -> Option<&str> {
        self.stream_id.as_ref().and_then(Value::as_str)
    }
}

/// Trigger parameters after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub date_from: chrono::NaiveDate,
    pub search_term: String,
    pub stream_id: String,
}

impl PipelineRequest {
    /// `date_from` in the format the content API expects.
    pub fn date_from_param(&self) -> String {
        self.date_from.format("%Y-%m-%d").to_string()
    }
}

use serde_json::Value as JsonValue;

use crate::{resolvers::ResolveError, source::SourceError};

/// The uniform result shape for mutation-style fields. Constructed exactly
/// once per mutation resolution, immediately before the engine resolves the
/// envelope's own sub-fields against it.
#[derive(Debug, Clone)]
pub struct ResultEnvelope {
    pub code: i64,
    pub success: bool,
    pub message: String,
    pub payload: Option<JsonValue>,
}

impl ResultEnvelope {
    /// Renders the envelope as a raw record so envelope sub-fields resolve
    /// through the ordinary default-resolver path. The payload lands under
    /// the schema's declared payload field name (`track` in the catalog
    /// schema).
    pub fn into_record(self, payload_field: &str) -> JsonValue {
        let mut record = serde_json::Map::new();
        record.insert("code".to_string(), JsonValue::from(self.code));
        record.insert("success".to_string(), JsonValue::Bool(self.success));
        record.insert("message".to_string(), JsonValue::String(self.message));
        record.insert(
            payload_field.to_string(),
            self.payload.unwrap_or(JsonValue::Null),
        );
        JsonValue::Object(record)
    }
}

/// Maps a successful mutation outcome into an envelope. Pure; never fails.
pub fn normalize_success(payload: JsonValue, message: String) -> ResultEnvelope {
    ResultEnvelope {
        code: 200,
        success: true,
        message,
        payload: Some(payload),
    }
}

/// Maps any resolver failure into an envelope. Structured upstream failures
/// keep their status and body; every other shape (missing records, outages,
/// transport and decode problems, bad arguments) falls back to a status
/// that fits its class and the error's display text, so a malformed or
/// unexpected failure can never escape normalization.
pub fn normalize_failure(error: &ResolveError) -> ResultEnvelope {
    let (code, message) = match error {
        ResolveError::Source(SourceError::Upstream { status, body }) => {
            (*status as i64, body.clone())
        }
        ResolveError::Source(SourceError::NotFound { .. }) => (404, error.to_string()),
        ResolveError::Source(SourceError::Unavailable(_)) => (503, error.to_string()),
        ResolveError::Source(SourceError::Transport(_))
        | ResolveError::Source(SourceError::Decode(_)) => (500, error.to_string()),
        ResolveError::MissingArgument(_, _) => (400, error.to_string()),
    };
    ResultEnvelope {
        code,
        success: false,
        message,
        payload: None,
    }
}

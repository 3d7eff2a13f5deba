pub mod envelope;
pub mod error;
pub mod value;

use serde::Serialize;

use crate::response::{error::FieldError, value::Value};

/// The assembled outcome of one query execution: partial or complete data
/// mirroring the requested shape, plus every field-level failure recorded
/// along the way.
#[derive(Debug, Serialize, PartialEq)]
pub struct QueryResponse {
    pub data: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

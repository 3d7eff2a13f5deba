use std::fmt::{self, Display};

use serde::Serialize;

/// One recorded field-level failure: the message and the path of the field
/// that produced it, root-down, with list positions as indexes.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

impl FieldError {
    pub fn new(message: impl Into<String>, path: Vec<PathSegment>) -> Self {
        FieldError {
            message: message.into(),
            path,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{}", name),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Renders a field path for error messages, e.g. `tracksForHome.0.author`.
pub fn render_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(|segment| segment.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

//! Per-paper error types. None of these abort a corpus run.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A value in an extraction file did not have the expected JSON type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}`: expected {expected}, found {found}")]
pub struct ShapeError {
    pub field: String,
    pub expected: &'static str,
    pub found: &'static str,
}

impl ShapeError {
    pub fn new(field: impl Into<String>, expected: &'static str, found: &Value) -> Self {
        Self {
            field: field.into(),
            expected,
            found: json_type_name(found),
        }
    }
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("paper {paper_id}: read failed: {source}")]
    Io {
        paper_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("paper {paper_id}: malformed JSON: {source}")]
    Malformed {
        paper_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("paper {paper_id}: unexpected field shape: {source}")]
    UnexpectedShape {
        paper_id: String,
        #[source]
        source: ShapeError,
    },
}

impl RecordError {
    pub fn paper_id(&self) -> &str {
        match self {
            RecordError::Io { paper_id, .. }
            | RecordError::Malformed { paper_id, .. }
            | RecordError::UnexpectedShape { paper_id, .. } => paper_id,
        }
    }

    pub fn kind(&self) -> SkipKind {
        match self {
            RecordError::Io { .. }              => SkipKind::Io,
            RecordError::Malformed { .. }       => SkipKind::Malformed,
            RecordError::UnexpectedShape { .. } => SkipKind::UnexpectedShape,
        }
    }
}

/// Serializable classification of a skipped paper.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    Io,
    Malformed,
    UnexpectedShape,
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null      => "null",
        Value::Bool(_)   => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_)  => "list",
        Value::Object(_) => "mapping",
    }
}

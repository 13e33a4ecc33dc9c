//! Error types for building shapes and for decoding documents.
use thiserror::Error;

use crate::document::NodeKind;

/// Per-call decode failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("missing required field `{field}`")]
    MissingRequiredField { field: String },

    #[error("field `{field}`: expected {expected}, found {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: NodeKind,
    },

    #[error("field `{field}`: transform failed: {cause}")]
    TransformError { field: String, cause: String },

    #[error("no case of `{enum_name}` matches the document")]
    NoMatchingCase { enum_name: String },

    #[error("case `{case}`: missing associated value {slot}")]
    MissingAssociatedValue { case: String, slot: String },
}

/// Shape construction failures. A shape that fails to build never decodes.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ambiguous configuration: {0}")]
    AmbiguousConfiguration(String),

    #[error("field `{field}`: {detail}")]
    InvalidField { field: String, detail: String },

    #[error("case `{case}`: {detail}")]
    InvalidCase { case: String, detail: String },

    #[error("unknown type `{0}`")]
    UnknownType(String),

    #[error("type `{0}` refers to itself")]
    CyclicType(String),

    #[error("shape file: {0}")]
    Manifest(String),
}

impl ConfigError {
    pub(crate) fn field(field: &str, detail: impl Into<String>) -> Self {
        ConfigError::InvalidField { field: field.to_string(), detail: detail.into() }
    }

    pub(crate) fn case(case: &str, detail: impl Into<String>) -> Self {
        ConfigError::InvalidCase { case: case.to_string(), detail: detail.into() }
    }
}

use std::num::{ParseFloatError, ParseIntError};
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by custom ingestion hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ConfbindError {
    #[error("Invalid field table for {record}: {reason}")]
    Shape { record: &'static str, reason: String },

    #[error("Failed to set {expected} field {field} due to type mismatch (got {found})")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Failed to set field {field}: {source}")]
    Conversion {
        field: String,
        source: ConversionError,
    },

    #[error("Unexpected field type for {field}: {kind}")]
    UnsupportedKind { field: String, kind: &'static str },

    /// A custom field's own ingestion failed. Displayed verbatim.
    #[error("{source}")]
    Delegation { field: String, source: BoxError },

    #[error("Failed to parse {origin}: {source}")]
    JsonParse {
        origin: String,
        source: serde_json::Error,
    },

    #[error("Failed to parse {origin}: {source}")]
    TomlParse {
        origin: String,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Decode(serde_json::Error),

    #[error("Failed to decode field {field}: {source}")]
    DocumentField {
        field: String,
        source: serde_json::Error,
    },

    #[error("Unknown key '{key}' in {origin} (line {line})")]
    UnknownKey {
        key: String,
        origin: String,
        line: usize,
    },

    #[error("Unknown keys in config document")]
    UnknownKeys(Vec<ConfbindError>),

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ConfbindError {
    /// Name of the field the error is attached to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfbindError::TypeMismatch { field, .. }
            | ConfbindError::Conversion { field, .. }
            | ConfbindError::UnsupportedKind { field, .. }
            | ConfbindError::Delegation { field, .. }
            | ConfbindError::DocumentField { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Why a single value could not be converted into its target type.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("expected value to satisfy the integer family, got {found}")]
    NotInteger { found: &'static str },

    #[error("expected value to satisfy the float family, got {found}")]
    NotFloat { found: &'static str },

    #[error("expected a {expected} value, got {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("invalid integer {text:?}: {source}")]
    ParseInt {
        text: String,
        source: ParseIntError,
    },

    #[error("invalid float {text:?}: {source}")]
    ParseFloat {
        text: String,
        source: ParseFloatError,
    },

    #[error("invalid boolean {text:?}")]
    ParseBool { text: String },
}

/// A `Nullable` wire literal that could not be decoded.
#[derive(Debug, Error)]
#[error("Failed to decode {bytes:?}: {source}")]
pub struct DecodeError {
    pub bytes: String,
    pub source: serde_json::Error,
}

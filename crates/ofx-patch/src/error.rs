//! Error types for patch parsing and application

use crate::operation::PatchOp;
use crate::path::{FieldPath, PathError};

/// Errors raised while parsing or applying patch operations
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// Payload is not an operation list or envelope
    #[error("malformed patch payload: {0}")]
    Malformed(String),

    /// Unrecognized verb
    #[error("unknown patch op: '{0}'")]
    UnknownOp(String),

    /// Path syntax error
    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    /// Path does not address an existing field
    #[error("path not found: '{0}'")]
    PathNotFound(FieldPath),

    /// Path addresses a field that cannot be patched
    #[error("path is immutable: '{0}'")]
    ImmutablePath(FieldPath),

    /// `add`/`replace` without value
    #[error("'{op}' at '{path}' requires a value")]
    MissingValue { op: PatchOp, path: FieldPath },

    /// `remove` with value
    #[error("'remove' at '{path}' must not carry a value")]
    UnexpectedValue { path: FieldPath },

    /// Verb needs a target path
    #[error("'{op}' requires a path")]
    MissingPath { op: PatchOp },

    /// Value cannot be used at this path
    #[error("invalid value at '{path}': {reason}")]
    InvalidValue { path: FieldPath, reason: String },

    /// Patched document no longer fits the record type
    #[error("type mismatch at '{path}': {message}")]
    TypeMismatch { path: FieldPath, message: String },

    /// Patched record fails structural validation
    #[error("patch at '{path}' leaves record invalid: {}", .messages.join("; "))]
    Invalid {
        path: FieldPath,
        messages: Vec<String>,
    },

    /// Record could not be converted to a document
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PatchError {
    /// Path the failing operation targeted (if known)
    #[must_use]
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::PathNotFound(path)
            | Self::ImmutablePath(path)
            | Self::MissingValue { path, .. }
            | Self::UnexpectedValue { path }
            | Self::InvalidValue { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::Invalid { path, .. } => Some(path),
            _ => None,
        }
    }
}

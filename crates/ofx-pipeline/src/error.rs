//! Error types for pipeline operations

use ofx_patch::PatchError;
use ofx_resource::{ResourceError, StoreError};
use std::fmt::{Debug, Display};

/// Errors surfaced by pipeline operations
///
/// Every failure of an operation, whether raised by the orchestrator, a
/// built-in precondition, the default action or an extension, reaches the
/// caller as one of these variants.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Required input is absent (or `null`)
    #[error("missing required input: '{path}'")]
    MissingInput { path: String },

    /// Input is present but cannot be read as the requested type
    #[error("input '{path}' is not a valid {expected}: {message}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        message: String,
    },

    /// Target resource does not exist
    #[error("{kind} with id '{id}' not found")]
    EntityNotFound { kind: &'static str, id: String },

    /// Creation payload failed structural validation
    #[error("entity is invalid: {}", .messages.join("; "))]
    EntityInvalid { messages: Vec<String> },

    /// Operation precondition violated
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Actor binding required by the default action is absent or of another kind
    #[error("actor '{role}' is missing or not a {expected}")]
    MissingActor { role: String, expected: &'static str },

    /// Patch operation failed
    #[error(transparent)]
    Patch(#[from] PatchError),

    /// Store mutation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Resource encoding failed
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Result serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error raised by an extension, propagated verbatim
    #[error(transparent)]
    Extension(#[from] anyhow::Error),

    /// Cancellation token fired
    #[error("operation cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Wrap an extension error
    #[inline]
    pub fn extension(error: impl Into<anyhow::Error>) -> Self {
        Self::Extension(error.into())
    }

    /// Check if the target resource was not found
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntityNotFound { .. })
    }

    /// Check if the operation was cancelled
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Validation messages of an invalid entity
    #[must_use]
    pub fn validation_messages(&self) -> Option<&[String]> {
        match self {
            Self::EntityInvalid { messages } => Some(messages),
            _ => None,
        }
    }

    /// Downcast an extension error to its concrete type
    #[must_use]
    pub fn extension_ref<E>(&self) -> Option<&E>
    where
        E: Display + Debug + Send + Sync + 'static,
    {
        match self {
            Self::Extension(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("quota exceeded")]
    struct QuotaExceeded;

    #[test]
    fn pipeline_error_display() {
        let err = PipelineError::EntityNotFound {
            kind: "Client",
            id: "42".to_string(),
        };
        assert_eq!(err.to_string(), "Client with id '42' not found");
        assert!(err.is_not_found());

        let err = PipelineError::EntityInvalid {
            messages: vec!["secret is required".to_string(), "bad".to_string()],
        };
        assert_eq!(err.to_string(), "entity is invalid: secret is required; bad");
    }

    #[test]
    fn pipeline_error_validation_messages() {
        let err = PipelineError::EntityInvalid {
            messages: vec!["a".to_string()],
        };
        assert_eq!(err.validation_messages(), Some(&["a".to_string()][..]));
        assert!(PipelineError::Cancelled.validation_messages().is_none());
    }

    #[test]
    fn extension_error_is_verbatim() {
        let err = PipelineError::extension(QuotaExceeded);
        assert_eq!(err.to_string(), "quota exceeded");
        assert!(err.extension_ref::<QuotaExceeded>().is_some());
        assert!(PipelineError::Cancelled.extension_ref::<QuotaExceeded>().is_none());
    }

    #[test]
    fn patch_error_is_transparent() {
        let inner = PatchError::Malformed("x".to_string());
        let message = inner.to_string();
        assert_eq!(PipelineError::from(inner).to_string(), message);
    }
}

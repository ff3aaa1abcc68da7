//! Error types for Gantry handlers.
//!
//! Handlers do not return errors. Failures are accumulated on the
//! [`Context`](crate::Context) as [`ErrorRecord`]s, and the typed errors in
//! this module describe what went wrong when a body could not be decoded,
//! validated, or rendered.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metadata attached to errors recorded by [`Context::fail`](crate::Context::fail).
pub const ABORTED_META: &str = "Operation aborted";

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors produced by context helpers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The request body is not valid JSON for the target type. Displays
    /// the decoder's message unchanged.
    #[error(transparent)]
    Decode(#[from] serde_json::Error),

    /// The body decoded but failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A template was requested but no templates are loaded.
    #[error("no templates loaded")]
    NoTemplates,

    /// Rendering a template failed.
    #[error("failed to render template '{name}': {reason}")]
    Render {
        /// Template name.
        name: String,
        /// Renderer message.
        reason: String,
    },
}

impl CoreError {
    /// Creates a render error.
    #[must_use]
    pub fn render(name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Render {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

/// A decoded value that does not satisfy its own constraints.
///
/// # Example
///
/// ```
/// use gantry_core::ValidationError;
///
/// let err = ValidationError::field("quantity", "must be positive");
/// assert_eq!(err.to_string(), "quantity: must be positive");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Offending field, when the failure is tied to one.
    pub field: Option<String>,
    /// Human-readable reason.
    pub message: String,
}

impl ValidationError {
    /// A failure not tied to a specific field.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    /// A failure on one field.
    #[must_use]
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// One error accumulated on a context.
///
/// Records are append-only. They serialize as `{"msg": ..., "meta": ...}` so
/// a final middleware can echo them back to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Error message.
    pub msg: String,
    /// Arbitrary metadata supplied by the recorder.
    pub meta: serde_json::Value,
}

impl ErrorRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(msg: impl Into<String>, meta: serde_json::Value) -> Self {
        Self {
            msg: msg.into(),
            meta,
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

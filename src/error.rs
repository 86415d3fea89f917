//! Error types for the cat core

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CatError>;

/// Errors raised by the core.
///
/// Only two kinds exist: input that fails validation while a record is being
/// built, and an already-built object that breaks one of its invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatError {
    /// Backend record failed shape, type or range validation
    #[error("Malformed record at `{path}`: {reason}")]
    MalformedRecord { path: String, reason: String },

    /// A constructed Cat or CatSighting is internally inconsistent
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl CatError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CatError::MalformedRecord {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Field path of a malformed record, if this is one
    pub fn path(&self) -> Option<&str> {
        match self {
            CatError::MalformedRecord { path, .. } => Some(path),
            CatError::InvariantViolation(_) => None,
        }
    }
}

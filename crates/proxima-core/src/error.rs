//! Error types for Proxima operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used across
//! all Proxima crates. Uses `thiserror` for derive macros.
//!
//! # Taxonomy
//!
//! - [`Error::Config`]: a request named a field that is not registered
//! - [`Error::DimensionMismatch`]: a query vector's length does not match the
//!   registered dimension
//! - [`Error::Store`]: the datastore failed; the underlying error is carried
//!   unmodified as the source
//! - [`Error::InvalidData`]: a filter value has a shape that cannot be bound
//! - [`Error::Serialization`]: JSON encoding/decoding failure

use thiserror::Error;

/// Errors that can occur in Proxima operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (e.g., search against an unregistered field).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Query vector length does not match the field's registered dimension.
    #[error("Dimension mismatch for field '{field}': expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The vector field that was searched.
        field: String,
        /// The registered dimension.
        expected: usize,
        /// The length of the supplied query vector.
        actual: usize,
    },

    /// Datastore execution failure, passed through verbatim.
    #[error("Store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(field: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            field: field.into(),
            expected,
            actual,
        }
    }

    /// Wrap a datastore error without altering it.
    pub fn store(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Store(Box::new(source))
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// True if this error originated in the datastore.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// True if this error is a caller error raised before any query executed.
    pub fn is_caller(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::DimensionMismatch { .. } | Self::InvalidData(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using Proxima's Error type.
pub type Result<T> = std::result::Result<T, Error>;

//! Protocol error types.

use thiserror::Error;

/// Errors raised while building or encoding protocol values.
#[derive(Debug, Error)]
pub enum Error {
    /// A field path is syntactically invalid.
    #[error("invalid field path '{path}': {reason}")]
    InvalidPath {
        /// The offending path as written by the caller.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

//! Core error types.

use thiserror::Error;

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Static metadata defect: a related-field chain is cyclic, too long, or
    /// points at a field or model that does not exist.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Set operation across collections of different models.
    #[error("invalid operand: cannot combine '{left}' records with '{right}' records")]
    InvalidOperand {
        /// Model of the receiving collection.
        left: String,
        /// Model of the argument collection.
        right: String,
    },

    /// A field path does not resolve on the model.
    #[error("unresolved path '{path}' on model '{model}'")]
    UnresolvedPath {
        /// Model the path was resolved from.
        model: String,
        /// The path as written by the caller.
        path: String,
    },

    /// The model is not registered.
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    /// A value cannot be written to the given field.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// An operation that needs exactly one record got another count.
    #[error("expected a single '{model}' record, got {len}")]
    NotSingleton {
        /// Model of the collection.
        model: String,
        /// Number of records in the collection.
        len: usize,
    },

    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] modelkit_proto::Error),

    /// I/O error while loading configuration or schema files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error was raised by the storage collaborator rather than
    /// by metadata or path resolution.
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            Error::Storage(_)
                | Error::Transaction(_)
                | Error::Serialization(_)
                | Error::Deserialization(_)
        )
    }

    pub(crate) fn unresolved(model: &str, path: impl Into<String>) -> Self {
        Error::UnresolvedPath {
            model: model.to_string(),
            path: path.into(),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

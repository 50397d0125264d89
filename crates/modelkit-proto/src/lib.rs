//! modelkit protocol types.
//!
//! This crate defines the data shared between the metadata, query and
//! storage layers of modelkit.
//!
//! # Modules
//!
//! - [`value`] - Closed value variant for field data
//! - [`path`] - Dotted field paths
//! - [`condition`] - Condition trees for filtering
//! - [`error`] - Protocol error types

pub mod condition;
pub mod error;
pub mod path;
pub mod value;

pub use condition::{Condition, Operand, Operator, Predicate};
pub use error::Error;
pub use path::{FieldPath, PATH_SEPARATOR};
pub use value::{RecordId, Value};

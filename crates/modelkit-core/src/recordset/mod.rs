//! Record collections and their data operations.

mod collection;
mod data;
mod describe;
mod recursion;
mod values;

pub use collection::RecordCollection;
pub use values::{FieldMap, FieldValue};

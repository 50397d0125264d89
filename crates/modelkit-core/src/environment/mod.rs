//! Execution environments.

mod context;
mod environment;

pub use context::Context;
pub use environment::{Environment, UserId};

//! Builder API for ergonomic automaton construction.
//!
//! This module provides a fluent builder that validates a whole automaton
//! declaration before creating it, and a macro for declaring label enums.

mod error;
mod machine;
mod macros;
mod validate;

pub use error::BuildError;
pub use machine::AutomatonBuilder;
pub use validate::Check;

//! Output adapters for the command-line interface.

pub mod csv;
pub mod diagnostic;

//! Command-line interface for holerite.

mod commands;
mod icons;
mod progress;

pub use commands::{is_verbose, run};

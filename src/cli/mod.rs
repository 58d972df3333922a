//! Command-line interface definitions.

mod args;
pub mod validators;

pub use args::{Cli, Command, ConfigAction, EvaluateArgs, GlobalArgs, SelectArgs};

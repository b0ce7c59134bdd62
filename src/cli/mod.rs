//! Command line interface for kodegen_gitflow.
//!
//! This module parses the action subcommands, runs the selected action
//! around the main build and reports the outcome.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, MainBuild, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}

//! Command line interface for lodestone_release.

mod args;
mod commands;
mod output;

pub use args::{Args, RuntimeConfig};
pub use commands::execute;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute(args).await
}

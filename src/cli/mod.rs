//! Command line interface for hankstore_bundler.
//!
//! Argument parsing, logging setup and dispatch for the packaging steps, plus
//! the argument set of the `hankstore_postinstall` helper.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, PostInstallArgs, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    init_logging(args.verbose);
    execute_command(args).await
}

/// Initialise `env_logger`, honouring `RUST_LOG` when set.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}

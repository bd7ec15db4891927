mod cli;
mod commands;
pub mod core;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// Parse arguments, run the command and return the process exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();

    // Initialize structured logging
    let default_filter = if cli.quiet {
        "warn"
    } else {
        "info,blocklaunch_lib=debug"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    tracing::debug!("Blocklaunch {} starting", env!("CARGO_PKG_VERSION"));

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Could not start the async runtime: {}", e);
            return commands::EXIT_FAILED;
        }
    };

    runtime.block_on(commands::dispatch(cli))
}

//! Neurocog - Main Entry Point
//!
//! Train cognitive-status classifiers and serve predictions from the command line.

use clap::Parser;
use neurocog::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neurocog=info".into()),
        )
        .init();

    run(Cli::parse())
}

//! regen - Client library regeneration
//!
//! Imports staged generator output, applies the common library templates
//! and runs post-processing, in that order.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Scoped to this run rather than installed globally
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&cli))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::with_default(subscriber, || cli::run(cli))
}

fn env_filter(cli: &Cli) -> EnvFilter {
    if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod report;

#[cfg(test)]
mod test_utils;

use cli::Cli;

/// Main entry point for the demandcast CLI.
#[tokio::main]
async fn main() -> Result<()> {
    config::load_env();

    // Logs go to stderr so that stdout stays parseable with --json
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demandcast=info,session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("demandcast starting up");

    Cli::parse().run().await
}

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gridlock::app::RunOutcome;
use gridlock::cli::Cli;

fn main() -> Result<()> {
    let config = Cli::parse().into_config();

    let default_filter = if config.debug {
        "gridlock=debug"
    } else {
        "gridlock=info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        cols = config.grid.cols(),
        rows = config.grid.rows(),
        gravity = %config.gravity,
        live = config.live_preview,
        "starting gridlock"
    );

    match gridlock::run(&config).context("gridlock session failed")? {
        RunOutcome::Skipped(window_type) => {
            info!(%window_type, "left the active window alone");
        }
        RunOutcome::Finished(outcome) => {
            info!(?outcome, "done");
        }
    }

    Ok(())
}

//! Commons - a multi-entry frontend bundler with shared-chunk extraction
//!
//! Commons bundles several entry points at once and de-duplicates the code
//! they have in common: user-declared `[[shared_chunks]]` rules pull shared
//! modules into separately loadable chunks, and every entry gets a
//! deterministic, dependency-respecting load order.
//!
//! # Features
//! - Multi-entry builds with per-entry load-order manifests
//! - Shared-chunk extraction with filters and occurrence thresholds
//! - Async chunks for dynamic imports
//! - CSS and JSON modules

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod bundler;
mod cli;
mod config;
mod extract;
mod resolver;
mod transform;
mod utils;

pub use cli::Cli;
pub use config::Config;

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("commons=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("commons=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await
}

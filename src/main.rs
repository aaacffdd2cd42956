//! nasha - master catalog to listing-platform CSV converter.
//!
//! Reads a brand's master product CSV, classifies and decomposes each product
//! with an LLM, and writes import files for Weedmaps, I Heart Jane, Leafly
//! and Squarespace.

mod cli;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let default_filter = if cli::is_verbose() {
        "nasha=info"
    } else {
        "nasha=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}

//! Message Parser HTTP server
//!
//! Accepts chat message text and answers with mentions, emoticons and titled links.

use anyhow::Context;
use clap::Parser;
use message_parser::server;
use message_parser::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        "Message parser {} starting on {}:{}",
        message_parser::VERSION,
        config.host,
        config.port
    );

    server::serve(config)
        .await
        .context("message parser server failed")
}

//! A command-line client for the Hell Let Loose RCON protocol.

mod commands;
mod config;

use clap::Parser;
use eyre::Context;
use rcon_client::Rcon;

use crate::config::CliConfig;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = CliConfig::parse();

    let client = Rcon::new(config.host.clone(), config.port, config.password.clone()).with_timeout(config.timeout);

    client
        .wait_until_connected()
        .await
        .with_context(|| format!("failed to connect to {}:{}", config.host, config.port))?;
    tracing::info!(host = %config.host, port = config.port, "connected");

    let result = commands::run(&client, config.command).await;
    client.disconnect().await;
    result
}

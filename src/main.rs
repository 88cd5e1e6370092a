#![warn(clippy::all, clippy::pedantic)]

use anyhow::Result;
use clap::Parser;
use patchwarden::Config;
use patchwarden::cli::Cli;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn log_level(raw: &str) -> Level {
    raw.parse().unwrap_or(Level::INFO)
}

#[tokio::main]
async fn main() -> Result<()> {
    // The probes' HTTP client needs a process-level crypto provider.
    if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
        eprintln!("Warning: Failed to install default crypto provider: {e:?}");
    }

    let cli = Cli::parse();
    let mut config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_init()?,
    };
    config.apply_env_overrides();
    config.validate()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(&config.logging.level))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    patchwarden::app::dispatch::dispatch(cli, Arc::new(config)).await
}

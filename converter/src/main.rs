//! Fintrack currency converter
//!
//! Converts amounts between currencies using live rates, falling back to
//! built-in rates when the provider is unavailable.

use clap::Parser;
use tracing::{debug, error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fintrack_fx::{ConversionService, FxServiceConfig};

mod cli;
mod commands;

use cli::Args;

fn init_logging(json: bool) {
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    // Load configuration
    let mut config = FxServiceConfig::from_env();
    if let Some(app_id) = args.app_id {
        config.app_id = app_id;
    }
    if let Some(url) = args.provider_url {
        config.provider_url = url;
    }
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }
    if config.app_id.is_empty() {
        warn!("No FX_APP_ID configured, fallback rates are used if the provider rejects requests");
    }

    debug!(
        provider_url = %config.provider_url,
        ttl_secs = config.ttl.num_seconds(),
        "Starting converter"
    );

    let service = ConversionService::from_config(&config);
    let output = commands::run(&service, args.command).await?;
    println!("{}", output);

    Ok(())
}

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use sandbox_forecast::config::Config;
use sandbox_forecast::model::MarketInputs;
use sandbox_forecast::service::ForecastService;

const USAGE: &str = "usage: sandbox-forecast <inputs.json> [horizon ...]";

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Set SANDBOX_FORECAST_CONFIG or provide config/default.toml");
            std::process::exit(1);
        }
    };

    // Logs go to stderr so stdout carries only the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                config
                    .logging
                    .level
                    .parse()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            }),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .json()
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        bail!(USAGE);
    };
    let horizons: Vec<String> = args.collect();

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let inputs: MarketInputs = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse market inputs from {}", path.display()))?;

    tracing::info!(
        symbol = inputs.symbol(),
        as_of = %inputs.as_of(),
        history = inputs.history.len(),
        options = inputs.options.len(),
        dark_pool = inputs.dark_pool.len(),
        events = inputs.events.len(),
        "Starting sandbox-forecast"
    );

    let service = ForecastService::new(config)?;
    let report = service.predict(&inputs, horizons.as_slice()).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

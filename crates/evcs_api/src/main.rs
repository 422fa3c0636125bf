use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use evcs_api::create_app;
use evcs_core::StationConfig;
use evcs_engine::Engine;

/// Command line arguments for the evcs server
#[derive(Parser, Debug)]
#[command(name = "evcs")]
#[command(about = "EV charging station admission control and scheduling")]
struct Args {
    /// Path to the station configuration JSON file
    #[arg(short, long)]
    config: PathBuf,

    /// Port to bind the server to
    #[arg(short, long, default_value = "3000")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt().pretty().init();

    let config_content = tokio::fs::read_to_string(&args.config)
        .await
        .with_context(|| format!("Failed to read config file '{}'", args.config.display()))?;

    let station_config: StationConfig = serde_json::from_str(&config_content)
        .with_context(|| format!("Failed to parse config file '{}'", args.config.display()))?;

    tracing::info!(
        "Loaded station config from {}: {}",
        args.config.display(),
        station_config.name
    );

    let engine = Engine::new(station_config).context("Invalid station configuration")?;
    engine.start();

    let app = create_app(engine);

    let bind_addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

use argh::FromArgs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use climacell_relay::archive::{Archiver, FsBlobStore};
use climacell_relay::config::RelayConfig;
use climacell_relay::fetch::WeatherFetcher;
use climacell_relay::http_server::{run_http_server, AppState};
use climacell_relay::publish::ZenohPublisher;

/// ClimaCell weather relay: fetch, normalize, publish, archive.
#[derive(FromArgs)]
struct Args {
    /// path to relay configuration file
    #[argh(option, short = 'c', default = "default_config_path()")]
    config: PathBuf,

    /// zenoh endpoint to connect to
    #[argh(option, short = 'z')]
    zenoh_endpoint: Option<String>,

    /// HTTP port (overrides the configured port)
    #[argh(option, short = 'p')]
    port: Option<u16>,
}

fn default_config_path() -> PathBuf {
    PathBuf::from("configs/relay.yaml")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();

    log::info!("Loading config from: {}", args.config.display());
    let config = RelayConfig::load(&args.config)?;
    let source_tz = config.source_zone()?;
    let target_tz = config.target_zone()?;
    log::info!(
        "Location: ({}, {}), zones: {} -> {}, topic: {}",
        config.latitude,
        config.longitude,
        config.source_tz,
        config.target_tz,
        config.topic
    );

    let api_key = config.api_key.resolve()?;

    // Zenoh session
    let mut zenoh_config = zenoh::Config::default();
    let endpoint = args
        .zenoh_endpoint
        .or_else(|| std::env::var("RELAY_ZENOH_ENDPOINT").ok());
    if let Some(endpoint) = &endpoint {
        zenoh_config
            .insert_json5("connect/endpoints", &format!("[\"{endpoint}\"]"))
            .map_err(|e| anyhow::anyhow!("Failed to set zenoh endpoint: {e}"))?;
    }

    log::info!("Connecting to Zenoh...");
    let session = zenoh::open(zenoh_config)
        .await
        .map_err(|e| anyhow::anyhow!("Zenoh open failed: {e}"))?;
    log::info!("Zenoh session established");

    let store = Arc::new(FsBlobStore::new(config.archive_dir.clone()));
    let state = AppState {
        fetcher: Arc::new(WeatherFetcher::new(&config, api_key)),
        publisher: Arc::new(ZenohPublisher::new(
            session.clone(),
            config.topic.clone(),
            Duration::from_secs(config.publish_timeout_secs),
        )),
        archiver: Arc::new(Archiver::new(store, source_tz, target_tz)),
        source_tz,
        target_tz,
    };

    // Graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    ctrlc::set_handler(move || {
        log::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    })?;

    let port = args.port.unwrap_or(config.http_port);
    run_http_server(state, port, shutdown_rx).await?;

    log::info!("Relay shutting down");
    session
        .close()
        .await
        .map_err(|e| anyhow::anyhow!("Zenoh close failed: {e}"))?;

    Ok(())
}

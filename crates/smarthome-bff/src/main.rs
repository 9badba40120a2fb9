//! smarthome-bff - Smart-home backend-for-frontend gateway
//!
//! Serves the frontend-facing REST API and forwards every call to the
//! device registry or the telemetry store.
//!
//! Usage:
//!   smarthome-bff [--config gateway.toml] [--port 8080]
//!
//! Without a config file the built-in defaults are used; `--port`,
//! `--device-service-url`, `--telemetry-service-url` and `--timeout-secs`
//! (or their environment variables) override the file.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use smarthome_api::{create_router, AppState};
use smarthome_client::{DeviceClient, HttpTransport, TelemetryClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{GatewayConfig, Overrides};

#[derive(Parser)]
#[command(name = "smarthome-bff")]
#[command(author, version, about = "Smart-home backend-for-frontend gateway")]
struct Cli {
    /// Gateway config file (TOML)
    #[arg(short, long, env = "BFF_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "BFF_PORT")]
    port: Option<u16>,

    /// Base URL of the device registry
    #[arg(long, env = "DEVICE_SERVICE_URL")]
    device_service_url: Option<String>,

    /// Base URL of the telemetry store
    #[arg(long, env = "TELEMETRY_SERVICE_URL")]
    telemetry_service_url: Option<String>,

    /// Upper bound for each upstream request, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long, env = "BFF_LOG_JSON")]
    log_json: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            device_service_url: self.device_service_url.clone(),
            telemetry_service_url: self.telemetry_service_url.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "smarthome_bff=info,smarthome_api=info,smarthome_client=info,tower_http=info".into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    tracing::info!("Starting smarthome-bff");

    if let Some(path) = &cli.config {
        tracing::info!("Loading config from: {}", path.display());
    }
    let config = GatewayConfig::load(cli.config.as_deref())?.merge_with_args(&cli.overrides());
    config.validate().context("Invalid configuration")?;

    // One transport shared by both clients
    let transport = HttpTransport::with_config(config.transport_config())
        .context("Failed to create HTTP transport")?;
    let devices = DeviceClient::with_transport(&config.device_service.url, transport.clone())
        .context("Failed to create device registry client")?;
    let telemetry = TelemetryClient::with_transport(&config.telemetry_service.url, transport)
        .context("Failed to create telemetry store client")?;

    tracing::info!(
        device_service = %devices.base_url(),
        telemetry_service = %telemetry.base_url(),
        timeout_secs = config.http.timeout_secs,
        "Upstream services configured"
    );

    let state = AppState::new(Arc::new(devices), Arc::new(telemetry));
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

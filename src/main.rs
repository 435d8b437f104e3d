//! Clinic API Gateway
//!
//! Single public entry point in front of the clinic's backend services.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────┐
//!                              │                 API GATEWAY                  │
//!     Client Request           │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!     ─────────────────────────┼─▶│  http   │───▶│ routing  │───▶│  auth   │──┼──▶ Authority
//!                              │  │ server  │    │  table   │    │ client  │  │    (verify-token)
//!                              │  └─────────┘    └──────────┘    └────┬────┘  │
//!                              │                                      │       │
//!                              │                                      ▼       │
//!     Client Response          │  ┌─────────┐                   ┌─────────┐   │
//!     ◀────────────────────────┼──│ relay   │◀──────────────────│  proxy  │◀──┼──── Backend
//!                              │  │verbatim │                   │forwarder│   │     Service
//!                              │  └─────────┘                   └─────────┘   │
//!                              │                                              │
//!                              │  health aggregator · config · observability  │
//!                              │  lifecycle                                   │
//!                              └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use clinic_gateway::config::loader::load_config;
use clinic_gateway::lifecycle::signals::spawn_signal_listener;
use clinic_gateway::observability::{logging, metrics};
use clinic_gateway::{GatewayServer, Shutdown, StartupError};

#[derive(Parser)]
#[command(name = "clinic-gateway", version)]
#[command(about = "API gateway with delegated authentication", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Built-in defaults apply when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "clinic-gateway starting"
    );

    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e| StartupError::Metrics(format!("invalid metrics address: {e}")))?;
        metrics::init_metrics(addr).map_err(StartupError::Metrics)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let server = GatewayServer::new(config)?;

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

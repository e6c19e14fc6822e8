//! Waypoint server binary.
//!
//! ```text
//!     Client Request ──▶ axum wildcard ──▶ normalize ──▶ router ──▶ single write ──▶ Client
//!                                              │             │
//!                                              └─ failure ───┴──▶ error translator
//! ```
//!
//! Serves a small demonstration router:
//! - `GET /` reports liveness
//! - any method on `/echo` returns the normalized request as JSON
//! - everything else is 404

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use waypoint::config::resolve_config;
use waypoint::http::error::{INVALID_ROUTE_MESSAGE, NOT_FOUND_STATUS};
use waypoint::http::server::HttpServer;
use waypoint::lifecycle::{spawn_signal_listener, Shutdown};
use waypoint::observability::{logging, metrics};
use waypoint::{MainDependencies, Method, NormalizedRequest, RouteResult, RouterOutcome};

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "Minimal HTTP request-processing pipeline", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener port.
    #[arg(short, long)]
    port: Option<u16>,
}

async fn demo_router(_deps: Arc<MainDependencies>, request: NormalizedRequest) -> RouteResult {
    match (request.method, request.route.as_str()) {
        (Method::Get, "/") => Ok(RouterOutcome::ok(r#"{"status":"ok"}"#)),
        (_, "/echo") => Ok(RouterOutcome::ok(serde_json::to_string(&request)?)),
        _ => Ok(RouterOutcome::new(NOT_FOUND_STATUS).with_message(INVALID_ROUTE_MESSAGE)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref(), cli.port)?;

    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.listener.host,
        port = config.listener.port,
        "waypoint starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let deps = Arc::new(MainDependencies::default());
    HttpServer::new(deps, Arc::new(demo_router))
        .with_host(config.listener.host.clone())
        .with_port(config.listener.port)
        .run(shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! Instrumented demo server.
//!
//! ```text
//!  demo-client ── GET /users/{id} + traceparent ──▶ ┌──────────────────────────┐
//!                                                  │ tower-http layers        │
//!                                                  │ server span middleware   │──▶ exporters
//!                                                  │ users handler ─ getUser  │    (stdout, Zipkin,
//!  ◀──────────── "user <name> (id <id>)" ───────── └──────────────────────────┘     OTLP)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use otel_demo::config::{load_or_default, validated};
use otel_demo::lifecycle::{spawn_signal_listener, Shutdown};
use otel_demo::observability::{init_logging, metrics, Telemetry};
use otel_demo::DemoServer;

const SERVICE_NAME: &str = "demo-server";

#[derive(Parser)]
#[command(name = "otel-demo")]
#[command(about = "Instrumented HTTP server for the tracing demo", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    let config = validated(config)?;

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "{} starting", SERVICE_NAME);

    let telemetry = match Telemetry::init(SERVICE_NAME, &config.telemetry)
        .await
        .and_then(|t| t.with_metrics(&config.telemetry.metrics))
    {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize telemetry");
            return Err(e.into());
        }
    };

    if config.observability.prometheus_enabled {
        match config.observability.prometheus_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_prometheus(addr) {
                    tracing::error!(error = %e, "Failed to start Prometheus endpoint");
                }
            }
            Err(_) => tracing::error!(
                prometheus_address = %config.observability.prometheus_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(&shutdown);

    let server = DemoServer::new(config.server.clone(), &telemetry);
    let served = server.run(listener, shutdown.subscribe()).await;

    if let Err(e) = telemetry.shutdown().await {
        tracing::error!(error = %e, "Telemetry shutdown failed");
    }
    served?;

    tracing::info!("Shutdown complete");
    Ok(())
}

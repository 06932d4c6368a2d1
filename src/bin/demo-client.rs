use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use opentelemetry::Context;

use otel_demo::config::{load_or_default, validated, ClientConfig};
use otel_demo::observability::{init_logging, Telemetry};
use otel_demo::http::{ClientError, ClientResponse};
use otel_demo::TracedClient;

const SERVICE_NAME: &str = "demo-client";

#[derive(Parser)]
#[command(name = "demo-client")]
#[command(about = "Send one traced request to the demo server", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server URL to request.
    #[arg(short, long)]
    server: Option<String>,

    /// Seconds to wait for span export before shutting down.
    #[arg(long)]
    export_wait_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(url) = cli.server {
        config.client.url = url;
    }
    if let Some(wait) = cli.export_wait_secs {
        config.client.export_wait_secs = wait;
    }
    let config = validated(config)?;

    init_logging(&config.observability);

    let telemetry = match Telemetry::init(SERVICE_NAME, &config.telemetry).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize telemetry");
            return Err(e.into());
        }
    };

    let result = send_request(&telemetry, &config.client).await;
    if let Ok(response) = &result {
        println!("Response Received: {}\n\n", response.body);
        println!("Waiting for few seconds to export spans ...\n");
        tokio::time::sleep(Duration::from_secs(config.client.export_wait_secs)).await;
        println!("Inspect traces on stdout");
    }

    // Flush the client span even when the request failed.
    let flushed = telemetry.shutdown().await;
    result?;
    flushed?;
    Ok(())
}

async fn send_request(telemetry: &Telemetry, config: &ClientConfig) -> Result<ClientResponse, ClientError> {
    let client = TracedClient::new(telemetry, Duration::from_secs(config.request_timeout_secs))?;

    println!("Sending request...");
    client.get(&Context::new(), &config.url).await
}

use std::path::PathBuf;

use clap::Parser;
use opentelemetry::Context;

use otel_demo::config::{load_or_default, validated};
use otel_demo::monolith::{SyntheticRequest, TRACER_NAME};
use otel_demo::observability::{init_logging, Telemetry};

const SERVICE_NAME: &str = "monolithic-demo";

#[derive(Parser)]
#[command(name = "monolithic")]
#[command(about = "Emit a synthetic frontend → backend → repository → db trace", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Make the database stage fail.
    #[arg(long)]
    fail_db: Option<bool>,

    /// Session id attribute for every span.
    #[arg(long)]
    session_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(fail) = cli.fail_db {
        config.monolith.simulate_db_failure = fail;
    }
    if let Some(session_id) = cli.session_id {
        config.monolith.session_id = session_id;
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

    SyntheticRequest::new(telemetry.tracer(TRACER_NAME))
        .session_id(config.monolith.session_id.clone())
        .fail_database(config.monolith.simulate_db_failure)
        .run(&Context::new())
        .await;

    tracing::info!(
        fail_database = config.monolith.simulate_db_failure,
        "Synthetic request finished"
    );

    telemetry.shutdown().await?;
    Ok(())
}

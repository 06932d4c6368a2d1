//! Tracer and meter provider setup.
//!
//! # Responsibilities
//! - Build the span export pipeline (stdout, Zipkin, OTLP) from config
//! - Build the metric export pipeline (OTLP or stdout, periodic)
//! - Hand out tracers, meters and the propagator as explicit objects
//! - Drain everything once at exit within a bounded time
//!
//! # Design Decisions
//! - Nothing is registered globally; binaries own a [`Telemetry`] and pass
//!   its instruments down
//! - One batch processor per span exporter, all sampled (always-on)
//! - Exporter construction failures are fatal to the caller

use std::sync::Arc;
use std::time::Duration;

use opentelemetry::metrics::{Meter, MeterProvider as _};
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::SERVICE_VERSION;

use crate::config::{MetricsConfig, MetricsExporterKind, TelemetryConfig};
use crate::observability::propagation::composite_propagator;

/// Errors raised while building or draining the telemetry pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to build {exporter} exporter: {source}")]
    Exporter {
        exporter: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("exporter setup task failed: {0}")]
    Setup(#[from] tokio::task::JoinError),

    #[error("telemetry shutdown failed: {0}")]
    Shutdown(String),

    #[error("telemetry shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),
}

fn exporter_error<E>(exporter: &'static str) -> impl FnOnce(E) -> TelemetryError
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |source| TelemetryError::Exporter {
        exporter,
        source: Box::new(source),
    }
}

/// Owned tracing and metrics pipeline for one process.
pub struct Telemetry {
    resource: Resource,
    tracer_provider: SdkTracerProvider,
    meter_provider: Option<SdkMeterProvider>,
    propagator: Arc<TextMapCompositePropagator>,
    shutdown_timeout: Duration,
}

impl Telemetry {
    /// Build the tracer provider for `service_name` with every span exporter
    /// enabled in `config`.
    pub async fn init(service_name: &str, config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let resource = Resource::builder()
            .with_service_name(service_name.to_string())
            .with_attribute(KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")))
            .build();

        let mut builder = SdkTracerProvider::builder()
            .with_sampler(Sampler::AlwaysOn)
            .with_resource(resource.clone());

        let traces = &config.traces;
        if traces.stdout {
            builder = builder.with_batch_exporter(opentelemetry_stdout::SpanExporter::default());
        }

        if traces.otlp.enabled {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(traces.otlp.endpoint.clone())
                .build()
                .map_err(exporter_error("otlp"))?;
            builder = builder.with_batch_exporter(exporter);
        }

        if traces.zipkin.enabled {
            // The Zipkin exporter owns a blocking HTTP client, which must not be
            // created on an async worker thread.
            let endpoint = traces.zipkin.endpoint.clone();
            let exporter = tokio::task::spawn_blocking(move || {
                opentelemetry_zipkin::ZipkinExporter::builder()
                    .with_collector_endpoint(endpoint)
                    .build()
            })
            .await?
            .map_err(exporter_error("zipkin"))?;
            builder = builder.with_batch_exporter(exporter);
        }

        tracing::info!(
            service = service_name,
            stdout = traces.stdout,
            zipkin = traces.zipkin.enabled,
            otlp = traces.otlp.enabled,
            "Tracer provider initialized"
        );

        Ok(Self {
            resource,
            ..Self::from_tracer_provider(builder.build())
        }
        .with_shutdown_timeout(Duration::from_millis(config.shutdown_timeout_ms)))
    }

    /// Wrap an already built tracer provider, with metrics disabled.
    pub fn from_tracer_provider(tracer_provider: SdkTracerProvider) -> Self {
        Self {
            resource: Resource::builder_empty().build(),
            tracer_provider,
            meter_provider: None,
            propagator: Arc::new(composite_propagator()),
            shutdown_timeout: Duration::from_secs(5),
        }
    }

    /// Upper bound on how long [`Telemetry::shutdown`] waits for the drain.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Attach a meter provider pushing to the configured metric sink.
    pub fn with_metrics(mut self, config: &MetricsConfig) -> Result<Self, TelemetryError> {
        if !config.enabled {
            return Ok(self);
        }

        let interval = Duration::from_secs(config.interval_secs);
        let reader = match config.exporter {
            MetricsExporterKind::Otlp => {
                let exporter = opentelemetry_otlp::MetricExporter::builder()
                    .with_tonic()
                    .with_endpoint(config.endpoint.clone())
                    .build()
                    .map_err(exporter_error("otlp metric"))?;
                PeriodicReader::builder(exporter).with_interval(interval).build()
            }
            MetricsExporterKind::Stdout => {
                PeriodicReader::builder(opentelemetry_stdout::MetricExporter::default())
                    .with_interval(interval)
                    .build()
            }
        };

        self.meter_provider = Some(
            SdkMeterProvider::builder()
                .with_resource(self.resource.clone())
                .with_reader(reader)
                .build(),
        );

        tracing::info!(
            exporter = ?config.exporter,
            interval_secs = config.interval_secs,
            "Meter provider initialized"
        );
        Ok(self)
    }

    /// Named tracer from this process's provider.
    pub fn tracer(&self, name: &'static str) -> SdkTracer {
        self.tracer_provider.tracer(name)
    }

    /// Named meter. Without metrics enabled the meter records nothing.
    pub fn meter(&self, name: &'static str) -> Meter {
        match &self.meter_provider {
            Some(provider) => provider.meter(name),
            None => SdkMeterProvider::default().meter(name),
        }
    }

    /// Propagator used on both sides of an HTTP hop.
    pub fn propagator(&self) -> Arc<TextMapCompositePropagator> {
        Arc::clone(&self.propagator)
    }

    /// Flush buffered telemetry and stop exporters.
    ///
    /// The SDK shutdown blocks, so it runs on the blocking pool and is
    /// abandoned after the configured timeout.
    pub async fn shutdown(self) -> Result<(), TelemetryError> {
        let Telemetry {
            tracer_provider,
            meter_provider,
            shutdown_timeout,
            ..
        } = self;

        let drain = tokio::task::spawn_blocking(move || {
            let mut failures = Vec::new();
            if let Err(e) = tracer_provider.shutdown() {
                failures.push(format!("tracer provider: {e}"));
            }
            if let Some(meter_provider) = meter_provider {
                if let Err(e) = meter_provider.shutdown() {
                    failures.push(format!("meter provider: {e}"));
                }
            }
            failures
        });

        let failures = tokio::time::timeout(shutdown_timeout, drain)
            .await
            .map_err(|_| TelemetryError::ShutdownTimeout(shutdown_timeout))??;

        if failures.is_empty() {
            tracing::info!("Telemetry flushed and shut down");
            Ok(())
        } else {
            Err(TelemetryError::Shutdown(failures.join("; ")))
        }
    }
}

//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use opentelemetry::trace::Status;
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider, SpanData, SpanExporter};
use otel_demo::config::ServerConfig;
use otel_demo::{DemoServer, Shutdown, Telemetry};
use tokio::net::TcpListener;

/// Telemetry whose spans are exported synchronously into memory.
pub fn in_memory_telemetry() -> (Telemetry, InMemorySpanExporter) {
    let exporter = InMemorySpanExporter::default();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    (Telemetry::from_tracer_provider(provider), exporter)
}

/// Span exporter whose records outlive provider shutdown.
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct RecordingExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

#[allow(dead_code)]
impl RecordingExporter {
    pub fn spans(&self) -> Vec<SpanData> {
        self.spans.lock().unwrap().clone()
    }
}

impl SpanExporter for RecordingExporter {
    fn export(&self, batch: Vec<SpanData>) -> impl Future<Output = OTelSdkResult> + Send {
        let spans = Arc::clone(&self.spans);
        async move {
            spans.lock().unwrap().extend(batch);
            Ok(())
        }
    }
}

/// Telemetry that batches spans like the binaries do.
#[allow(dead_code)]
pub fn batched_telemetry() -> (Telemetry, RecordingExporter) {
    let exporter = RecordingExporter::default();
    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter.clone())
        .build();
    (Telemetry::from_tracer_provider(provider), exporter)
}

/// Start the demo server on an ephemeral local port.
#[allow(dead_code)]
pub async fn start_server(telemetry: &Telemetry) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = DemoServer::new(ServerConfig::default(), telemetry);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown)
}

/// Find a finished span by name.
#[allow(dead_code)]
pub fn span<'a>(spans: &'a [SpanData], name: &str) -> &'a SpanData {
    spans
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("no span named {name:?}"))
}

#[allow(dead_code)]
pub fn is_error(span: &SpanData) -> bool {
    matches!(span.status, Status::Error { .. })
}

#[allow(dead_code)]
pub fn duration(span: &SpanData) -> Duration {
    span.end_time.duration_since(span.start_time).unwrap()
}

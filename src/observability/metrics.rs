//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Own the OpenTelemetry instruments the server updates per request
//! - Expose a Prometheus-compatible scrape endpoint for HTTP traffic
//!
//! # Metrics
//! - `users_req_count` (OpenTelemetry counter): requests to `/users/{id}`
//! - `demo_http_requests_total` (counter): requests by method, route, status
//! - `demo_http_request_duration_seconds` (histogram): latency by method, route
//!
//! # Design Decisions
//! - OpenTelemetry instruments are created from an explicit meter and
//!   stored in handler state
//! - Prometheus metrics go through the `metrics` facade; without an
//!   installed recorder the calls are no-ops

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use opentelemetry::metrics::{Counter, Meter};

/// Name of the meter the server's instruments come from.
pub const METER_NAME: &str = "demo-meter";

/// Instruments updated by the user lookup handler.
#[derive(Clone)]
pub struct ServerInstruments {
    user_requests: Counter<u64>,
}

impl ServerInstruments {
    pub fn new(meter: &Meter) -> Self {
        Self {
            user_requests: meter
                .u64_counter("users_req_count")
                .with_description("Number of requests to /users")
                .build(),
        }
    }

    /// Count one inbound `/users/{id}` request.
    pub fn record_user_request(&self) {
        self.user_requests.add(1, &[]);
    }
}

/// Install the global Prometheus recorder and its HTTP listener.
pub fn init_prometheus(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics endpoint listening");
    Ok(())
}

/// Record one completed HTTP request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    metrics::counter!(
        "demo_http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "demo_http_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Latest cumulative value of a `u64` counter in an in-memory export.
#[cfg(test)]
pub(crate) fn exported_counter(
    exporter: &opentelemetry_sdk::metrics::InMemoryMetricExporter,
    name: &str,
) -> u64 {
    use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData};

    let exported = exporter.get_finished_metrics().unwrap();
    let Some(latest) = exported.last() else {
        return 0;
    };
    latest
        .scope_metrics()
        .flat_map(|scope| scope.metrics())
        .filter(|metric| metric.name() == name)
        .map(|metric| match metric.data() {
            AggregatedMetrics::U64(MetricData::Sum(sum)) => sum.data_points().map(|p| p.value()).sum(),
            _ => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::metrics::MeterProvider as _;
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};

    #[test]
    fn test_user_counter_sums_requests() {
        let exporter = InMemoryMetricExporter::default();
        let provider = SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(exporter.clone()).build())
            .build();
        let instruments = ServerInstruments::new(&provider.meter(METER_NAME));

        instruments.record_user_request();
        instruments.record_user_request();
        provider.force_flush().unwrap();

        assert_eq!(exported_counter(&exporter, "users_req_count"), 2);
        assert_eq!(exported_counter(&exporter, "some_other_counter"), 0);
    }

    #[test]
    fn test_record_request_without_recorder() {
        record_request("GET", "/users/{id}", 200, Instant::now());
    }
}

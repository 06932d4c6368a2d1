//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure shared by the
//! server, client and monolithic binaries. All types derive Serde traits for
//! deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the demo programs.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DemoConfig {
    /// Instrumented HTTP server settings.
    pub server: ServerConfig,

    /// Instrumented HTTP client settings.
    pub client: ClientConfig,

    /// Synthetic trace generator settings.
    pub monolith: MonolithConfig,

    /// Span and metric export pipeline.
    pub telemetry: TelemetryConfig,

    /// Logging and Prometheus settings.
    pub observability: ObservabilityConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Full URL of the user lookup to request.
    pub url: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// How long to wait after the response before shutting telemetry down.
    pub export_wait_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/users/123".to_string(),
            request_timeout_secs: 30,
            export_wait_secs: 10,
        }
    }
}

/// Synthetic trace generator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonolithConfig {
    /// Whether the database stage reports a failure.
    pub simulate_db_failure: bool,

    /// Value of the `session-id` attribute on every generated span.
    pub session_id: String,
}

impl Default for MonolithConfig {
    fn default() -> Self {
        Self {
            simulate_db_failure: true,
            session_id: "abcde1234".to_string(),
        }
    }
}

/// Telemetry pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Span exporters.
    pub traces: TracesConfig,

    /// Metric export.
    pub metrics: MetricsConfig,

    /// Upper bound on the final drain at process exit, in milliseconds.
    pub shutdown_timeout_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            traces: TracesConfig::default(),
            metrics: MetricsConfig::default(),
            shutdown_timeout_ms: 5000,
        }
    }
}

/// Span exporter selection. Each enabled exporter gets its own batch processor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracesConfig {
    /// Pretty-print finished spans to stdout.
    pub stdout: bool,

    /// Zipkin v2 HTTP collector.
    pub zipkin: ExporterEndpoint,

    /// OTLP over gRPC collector.
    pub otlp: ExporterEndpoint,
}

impl Default for TracesConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            zipkin: ExporterEndpoint {
                enabled: true,
                endpoint: "http://localhost:9411/api/v2/spans".to_string(),
            },
            otlp: ExporterEndpoint {
                enabled: false,
                endpoint: "http://localhost:4317".to_string(),
            },
        }
    }
}

/// A remote exporter that can be switched on or off.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExporterEndpoint {
    pub enabled: bool,
    pub endpoint: String,
}

/// Which sink receives collected metrics.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricsExporterKind {
    Otlp,
    Stdout,
}

/// Metric export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable the meter provider.
    pub enabled: bool,

    /// Metric sink.
    pub exporter: MetricsExporterKind,

    /// OTLP collector endpoint (ignored for stdout).
    pub endpoint: String,

    /// Collection period in seconds.
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exporter: MetricsExporterKind::Otlp,
            endpoint: "http://localhost:4317".to_string(),
            interval_secs: 2,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub prometheus_enabled: bool,

    /// Prometheus endpoint bind address.
    pub prometheus_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            prometheus_enabled: true,
            prometheus_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: DemoConfig = toml::from_str(
            r#"
            [server]
            bind_address = "127.0.0.1:9000"

            [telemetry.traces.otlp]
            enabled = true
            endpoint = "http://collector:4317"

            [telemetry.metrics]
            exporter = "stdout"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert!(config.telemetry.traces.otlp.enabled);
        assert!(config.telemetry.traces.zipkin.enabled);
        assert_eq!(config.telemetry.metrics.exporter, MetricsExporterKind::Stdout);
        assert_eq!(config.telemetry.metrics.interval_secs, 2);
        assert_eq!(config.monolith.session_id, "abcde1234");
        assert!(config.monolith.simulate_db_failure);
    }
}

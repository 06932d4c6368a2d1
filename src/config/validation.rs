//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and exporter endpoints
//! - Validate value ranges (intervals and timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DemoConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted by a binary

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{DemoConfig, MetricsExporterKind};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A bind address is not `host:port`.
    InvalidSocketAddress { field: &'static str, value: String },
    /// An endpoint is not an absolute http(s) URL.
    InvalidUrl { field: &'static str, value: String },
    /// A duration that must be positive is zero.
    ZeroDuration { field: &'static str },
    /// The log level is not one of the tracing levels.
    UnknownLogLevel(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidSocketAddress { field, value } => {
                write!(f, "{} is not a socket address: {:?}", field, value)
            }
            ValidationError::InvalidUrl { field, value } => {
                write!(f, "{} is not an http(s) URL: {:?}", field, value)
            }
            ValidationError::ZeroDuration { field } => write!(f, "{} must be greater than zero", field),
            ValidationError::UnknownLogLevel(level) => write!(f, "unknown log level {:?}", level),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &DemoConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_socket_addr(&mut errors, "server.bind_address", &config.server.bind_address);
    check_positive(&mut errors, "server.request_timeout_secs", config.server.request_timeout_secs);

    check_url(&mut errors, "client.url", &config.client.url);
    check_positive(&mut errors, "client.request_timeout_secs", config.client.request_timeout_secs);

    let telemetry = &config.telemetry;
    if telemetry.traces.zipkin.enabled {
        check_url(&mut errors, "telemetry.traces.zipkin.endpoint", &telemetry.traces.zipkin.endpoint);
    }
    if telemetry.traces.otlp.enabled {
        check_url(&mut errors, "telemetry.traces.otlp.endpoint", &telemetry.traces.otlp.endpoint);
    }
    if telemetry.metrics.enabled {
        if telemetry.metrics.exporter == MetricsExporterKind::Otlp {
            check_url(&mut errors, "telemetry.metrics.endpoint", &telemetry.metrics.endpoint);
        }
        check_positive(&mut errors, "telemetry.metrics.interval_secs", telemetry.metrics.interval_secs);
    }
    check_positive(&mut errors, "telemetry.shutdown_timeout_ms", telemetry.shutdown_timeout_ms);

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::UnknownLogLevel(observability.log_level.clone()));
    }
    if observability.prometheus_enabled {
        check_socket_addr(&mut errors, "observability.prometheus_address", &observability.prometheus_address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidSocketAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn check_positive(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::ZeroDuration { field });
    }
}

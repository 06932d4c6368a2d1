//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Correlate log events with the span they describe
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Plain text without ANSI colours by default, JSON on request
//! - `RUST_LOG` overrides the configured level

use opentelemetry::trace::{SpanId, SpanRef, TraceId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global tracing subscriber. Call once per process.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_ascii_lowercase()));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_ansi(false))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
    }
}

/// Identifiers of an OpenTelemetry span, for attaching to log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanIds {
    pub trace_id: TraceId,
    pub span_id: SpanId,
}

impl SpanIds {
    pub fn of(span: &SpanRef<'_>) -> Self {
        let span_context = span.span_context();
        Self {
            trace_id: span_context.trace_id(),
            span_id: span_context.span_id(),
        }
    }
}

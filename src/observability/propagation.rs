//! Trace context propagation over HTTP headers.
//!
//! # Responsibilities
//! - Build the W3C TraceContext + Baggage propagator
//! - Adapt `http::HeaderMap` to the propagator's injector/extractor traits
//!
//! # Design Decisions
//! - The propagator is an owned value handed to the client and server, not
//!   a process-wide registration
//! - Header values that are not valid ASCII are skipped on extraction and
//!   dropped on injection

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::propagation::{Extractor, Injector, TextMapCompositePropagator};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

/// Propagator writing and reading `traceparent`, `tracestate` and `baggage`.
pub fn composite_propagator() -> TextMapCompositePropagator {
    TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ])
}

/// Read-only view of request headers for context extraction.
pub struct HeaderExtractor<'a>(pub &'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

/// Mutable view of outgoing headers for context injection.
pub struct HeaderInjector<'a>(pub &'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            self.0.insert(name, value);
        }
    }
}

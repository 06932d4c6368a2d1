//! Server span middleware.
//!
//! # Responsibilities
//! - Continue the caller's trace from propagated request headers
//! - Open a server span named after the matched route
//! - Make the span's Context available to handlers via request extensions
//! - Record status code on the span and in Prometheus metrics

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{SpanKind, Status, Tracer};
use opentelemetry::KeyValue;
use opentelemetry_semantic_conventions::attribute::{
    HTTP_REQUEST_METHOD, HTTP_RESPONSE_STATUS_CODE, HTTP_ROUTE, URL_PATH,
};

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::observability::propagation::HeaderExtractor;
use crate::observability::ScopedSpan;

/// Wrap each routed request in a `Server` span.
///
/// Must be installed with `route_layer` so the matched route is known.
pub async fn trace_http_request(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let start = Instant::now();
    let parent = state.propagator.extract(&HeaderExtractor(request.headers()));

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| path.clone());

    let builder = state
        .tracer
        .span_builder(route.clone())
        .with_kind(SpanKind::Server)
        .with_attributes(vec![
            KeyValue::new(HTTP_REQUEST_METHOD, method.clone()),
            KeyValue::new(HTTP_ROUTE, route.clone()),
            KeyValue::new(URL_PATH, path),
        ]);
    let scope = ScopedSpan::start(&state.tracer, &parent, builder);
    request.extensions_mut().insert(scope.context().clone());

    let response = next.run(request).await;

    let status = response.status();
    scope
        .span()
        .set_attribute(KeyValue::new(HTTP_RESPONSE_STATUS_CODE, i64::from(status.as_u16())));
    if status.is_server_error() {
        scope.span().set_status(Status::error(status.to_string()));
    }

    metrics::record_request(&method, &route, status.as_u16(), start);
    tracing::debug!(method = %method, route = %route, status = %status, "Request traced");

    response
}

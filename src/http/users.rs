//! User lookup handler.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Extension,
};
use opentelemetry::trace::{Status, Tracer};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::SdkTracer;

use crate::http::server::AppState;
use crate::observability::{ScopedSpan, SpanIds};

/// The only id the lookup knows about.
pub const KNOWN_USER_ID: &str = "123";

/// Name returned for [`KNOWN_USER_ID`].
pub const KNOWN_USER_NAME: &str = "otelmux tester";

/// Name returned for any other id.
pub const UNKNOWN_USER_NAME: &str = "unknown";

/// Look up a user's display name under a `getUser` span.
///
/// Unknown ids are not an error for the caller, but the span is marked as
/// failed so the miss shows up in the trace.
pub fn get_user(tracer: &SdkTracer, cx: &Context, id: &str) -> &'static str {
    let builder = tracer
        .span_builder("getUser")
        .with_attributes(vec![KeyValue::new("id", id.to_string())]);
    let scope = ScopedSpan::start(tracer, cx, builder);
    let ids = SpanIds::of(&scope.span());

    if id == KNOWN_USER_ID {
        tracing::info!(trace_id = %ids.trace_id, span_id = %ids.span_id, "Handling User ID: {}", id);
        KNOWN_USER_NAME
    } else {
        scope.span().set_status(Status::error("No user found"));
        tracing::warn!(trace_id = %ids.trace_id, span_id = %ids.span_id, "User ID: {} not found", id);
        UNKNOWN_USER_NAME
    }
}

/// `GET /users/{id}`, numeric ids only.
pub async fn user_handler(
    State(state): State<AppState>,
    Extension(cx): Extension<Context>,
    Path(id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return (StatusCode::NOT_FOUND, "404 page not found\n").into_response();
    }

    state.instruments.record_user_request();

    tracing::info!(uri = %uri, "Handling request");
    for (name, value) in headers.iter() {
        tracing::info!(header = %name, value = ?value, "  request header");
    }

    let name = get_user(&state.tracer, &cx, &id);
    format!("user {} (id {})\n", name, id).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};

    fn tracer() -> (SdkTracerProvider, InMemorySpanExporter, SdkTracer) {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let tracer = provider.tracer("mux-server");
        (provider, exporter, tracer)
    }

    #[test]
    fn test_known_user() {
        let (_provider, exporter, tracer) = tracer();

        assert_eq!(get_user(&tracer, &Context::new(), "123"), "otelmux tester");

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "getUser");
        assert!(!matches!(spans[0].status, Status::Error { .. }));
        assert!(spans[0]
            .attributes
            .contains(&KeyValue::new("id", "123".to_string())));
    }

    #[test]
    fn test_unknown_user_marks_span() {
        let (_provider, exporter, tracer) = tracer();

        assert_eq!(get_user(&tracer, &Context::new(), "42"), "unknown");

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].status, Status::error("No user found"));
    }
}

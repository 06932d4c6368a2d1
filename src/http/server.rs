//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the user lookup route
//! - Wire up middleware (server spans, tracing, timeout, request ID)
//! - Bind server to listener
//! - Stop gracefully when the shutdown broadcast fires

use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, middleware, routing::get, Router};
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry_sdk::trace::SdkTracer;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::middleware::trace_http_request;
use crate::http::users::user_handler;
use crate::observability::metrics::METER_NAME;
use crate::observability::{ServerInstruments, Telemetry};

/// Name of the tracer used for server-side spans.
pub const TRACER_NAME: &str = "mux-server";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub tracer: SdkTracer,
    pub propagator: Arc<TextMapCompositePropagator>,
    pub instruments: ServerInstruments,
}

impl AppState {
    pub fn from_telemetry(telemetry: &Telemetry) -> Self {
        Self {
            tracer: telemetry.tracer(TRACER_NAME),
            propagator: telemetry.propagator(),
            instruments: ServerInstruments::new(&telemetry.meter(METER_NAME)),
        }
    }
}

/// Instrumented demo HTTP server.
pub struct DemoServer {
    router: Router,
    config: ServerConfig,
}

impl DemoServer {
    /// Create a new HTTP server using the given telemetry pipeline.
    pub fn new(config: ServerConfig, telemetry: &Telemetry) -> Self {
        let state = AppState::from_telemetry(telemetry);
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/users/{id}", get(user_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), trace_http_request))
            .with_state(state)
            .layer(timeout_layer(config))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for serving or driving directly in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.request_timeout_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

}

/// Requests running past the configured limit are answered with `408`.
fn timeout_layer(config: &ServerConfig) -> TimeoutLayer {
    TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.request_timeout_secs),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use opentelemetry::metrics::MeterProvider as _;
    use opentelemetry::trace::{SpanKind, Status, TracerProvider as _};
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};
    use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};
    use tower::ServiceExt;

    use crate::observability::metrics::exported_counter;
    use crate::observability::propagation::composite_propagator;

    fn server() -> (DemoServer, InMemorySpanExporter) {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let telemetry = Telemetry::from_tracer_provider(provider);
        (DemoServer::new(ServerConfig::default(), &telemetry), exporter)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_known_user_reply() {
        let (server, exporter) = server();

        let response = server
            .router()
            .oneshot(Request::get("/users/123").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_text(response).await, "user otelmux tester (id 123)\n");

        let spans = exporter.get_finished_spans().unwrap();
        let names: Vec<_> = spans.iter().map(|s| s.name.as_ref()).collect();
        assert_eq!(names, ["getUser", "/users/{id}"]);
        assert_eq!(spans[1].span_kind, SpanKind::Server);
        assert_eq!(spans[0].parent_span_id, spans[1].span_context.span_id());
    }

    #[tokio::test]
    async fn test_unknown_user_reply() {
        let (server, exporter) = server();

        let response = server
            .router()
            .oneshot(Request::get("/users/7").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "user unknown (id 7)\n");

        let spans = exporter.get_finished_spans().unwrap();
        let get_user = spans.iter().find(|s| s.name == "getUser").unwrap();
        assert_eq!(get_user.status, Status::error("No user found"));
        let server_span = spans.iter().find(|s| s.name == "/users/{id}").unwrap();
        assert!(!matches!(server_span.status, Status::Error { .. }));
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_not_found() {
        let (server, exporter) = server();

        let response = server
            .router()
            .oneshot(Request::get("/users/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let spans = exporter.get_finished_spans().unwrap();
        assert!(spans.iter().all(|s| s.name != "getUser"));
    }

    #[tokio::test]
    async fn test_user_counter_counts_routed_lookups() {
        let exporter = InMemoryMetricExporter::default();
        let meter_provider = SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(exporter.clone()).build())
            .build();
        let tracer_provider = SdkTracerProvider::builder().build();
        let state = AppState {
            tracer: tracer_provider.tracer(TRACER_NAME),
            propagator: Arc::new(composite_propagator()),
            instruments: ServerInstruments::new(&meter_provider.meter(METER_NAME)),
        };
        let router = DemoServer::build_router(&ServerConfig::default(), state);

        let send = |path: &'static str| {
            router
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
        };

        assert_eq!(send("/users/abc").await.unwrap().status(), StatusCode::NOT_FOUND);
        meter_provider.force_flush().unwrap();
        assert_eq!(exported_counter(&exporter, "users_req_count"), 0);

        assert_eq!(send("/users/123").await.unwrap().status(), StatusCode::OK);
        assert_eq!(send("/users/7").await.unwrap().status(), StatusCode::OK);
        meter_provider.force_flush().unwrap();
        assert_eq!(exported_counter(&exporter, "users_req_count"), 2);
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let config = ServerConfig {
            request_timeout_secs: 1,
            ..ServerConfig::default()
        };
        let router = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .layer(timeout_layer(&config));

        let response = router
            .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}

//! Instrumented HTTP client.
//!
//! # Responsibilities
//! - Open a `Client` span per outgoing request
//! - Inject the span's context into request headers
//! - Record response status on the span
//!
//! # Design Decisions
//! - No retries; a transport error ends the request and is returned
//! - Error status codes are data for the caller but mark the span failed

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::{SpanKind, Status, Tracer};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::SdkTracer;
use opentelemetry_semantic_conventions::attribute::{
    HTTP_REQUEST_METHOD, HTTP_RESPONSE_STATUS_CODE, SERVER_ADDRESS, SERVER_PORT, URL_FULL,
};
use url::Url;

use crate::observability::propagation::HeaderInjector;
use crate::observability::{ScopedSpan, Telemetry};

/// Name of the tracer used for client-side spans.
pub const TRACER_NAME: &str = "demo-client";

/// Errors from a traced request.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientResponse {
    pub status: u16,
    pub body: String,
}

/// `reqwest` client that traces each request and propagates context.
#[derive(Clone)]
pub struct TracedClient {
    http: reqwest::Client,
    tracer: SdkTracer,
    propagator: Arc<TextMapCompositePropagator>,
}

impl TracedClient {
    pub fn new(telemetry: &Telemetry, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            tracer: telemetry.tracer(TRACER_NAME),
            propagator: telemetry.propagator(),
        })
    }

    /// Send `GET url` as a child of `cx` and read the whole body.
    pub async fn get(&self, cx: &Context, url: &str) -> Result<ClientResponse, ClientError> {
        let url = Url::parse(url).map_err(|source| ClientError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let mut attributes = vec![
            KeyValue::new(HTTP_REQUEST_METHOD, "GET"),
            KeyValue::new(URL_FULL, url.to_string()),
        ];
        if let Some(host) = url.host_str() {
            attributes.push(KeyValue::new(SERVER_ADDRESS, host.to_string()));
        }
        if let Some(port) = url.port_or_known_default() {
            attributes.push(KeyValue::new(SERVER_PORT, i64::from(port)));
        }
        let builder = self
            .tracer
            .span_builder("HTTP GET")
            .with_kind(SpanKind::Client)
            .with_attributes(attributes);
        let scope = ScopedSpan::start(&self.tracer, cx, builder);

        let mut headers = HeaderMap::new();
        self.propagator
            .inject_context(scope.context(), &mut HeaderInjector(&mut headers));

        let result = async {
            let response = self.http.get(url).headers(headers).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(ClientResponse { status, body })
        }
        .await;

        match result {
            Ok(response) => {
                scope
                    .span()
                    .set_attribute(KeyValue::new(HTTP_RESPONSE_STATUS_CODE, i64::from(response.status)));
                if response.status >= 400 {
                    scope.span().set_status(Status::error(format!("HTTP {}", response.status)));
                }
                Ok(response)
            }
            Err(e) => {
                scope.span().set_status(Status::error(e.to_string()));
                tracing::error!(error = %e, "Request failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};

    #[tokio::test]
    async fn test_invalid_url_opens_no_span() {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let telemetry = Telemetry::from_tracer_provider(provider);
        let client = TracedClient::new(&telemetry, Duration::from_secs(1)).unwrap();

        let err = client.get(&Context::new(), "not a url").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl { .. }));
        assert!(exporter.get_finished_spans().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused_marks_span() {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let telemetry = Telemetry::from_tracer_provider(provider);
        let client = TracedClient::new(&telemetry, Duration::from_secs(1)).unwrap();

        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = client
            .get(&Context::new(), &format!("http://127.0.0.1:{}/users/123", port))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "HTTP GET");
        assert!(matches!(spans[0].status, Status::Error { .. }));
    }
}

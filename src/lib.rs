//! Tracing and metrics demo: an instrumented HTTP client and server, and a
//! synthetic multi-tier trace generator.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod monolith;
pub mod observability;

pub use config::schema::DemoConfig;
pub use http::{DemoServer, TracedClient};
pub use lifecycle::Shutdown;
pub use observability::Telemetry;

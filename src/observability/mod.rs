//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Binaries build one Telemetry (tracer.rs) at startup:
//!     → tracers and meters handed to server, client, monolith
//!     → scope.rs guards open/close spans under an explicit Context
//!     → propagation.rs carries the Context across HTTP hops
//!
//! Exports:
//!     → spans: stdout, Zipkin, OTLP (batched)
//!     → metrics: OTLP or stdout (periodic), Prometheus scrape (metrics.rs)
//!     → logs: logging.rs (tracing-subscriber), tagged with span ids
//! ```
//!
//! # Design Decisions
//! - No global tracer or meter providers
//! - Every span is owned by exactly one scope guard

pub mod logging;
pub mod metrics;
pub mod propagation;
pub mod scope;
pub mod tracer;

pub use logging::{init_logging, SpanIds};
pub use metrics::ServerInstruments;
pub use scope::ScopedSpan;
pub use tracer::{Telemetry, TelemetryError};

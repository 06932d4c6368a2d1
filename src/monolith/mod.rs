//! Synthetic trace tree generator.
//!
//! # Call Tree
//! ```text
//! HTTP POST /api-endpoint          demo-frontend             30ms ─┐        ┌─ 10ms
//!   /api-endpoint                  backend-api               80ms ─┤        ├─ 10ms
//!     CallQuery                    backend-query-repository  50ms ─┤        ├─ 30ms
//!       SELECT x,y,z FROM abc ...  db                       350ms ─┴────────┘
//! ```
//!
//! # Design Decisions
//! - No real I/O: every stage sleeps for its scripted time
//! - Each stage derives a new Context for its callee; nothing is shared
//! - A failing database is telemetry (status + exception event on
//!   `CallQuery`), never an error returned to the caller
//! - Silent and failing runs share one code path, selected by a flag

pub mod generator;
pub mod timeline;

pub use generator::{run_synthetic_request, QueryError, SyntheticRequest, TRACER_NAME};

//! HTTP client and server subsystem.
//!
//! # Data Flow
//! ```text
//! client.rs: start "HTTP GET" span → inject traceparent/baggage → reqwest
//!     ─────────────────────────── network ───────────────────────────
//! server.rs (Axum, tower-http layers)
//!     → middleware.rs (extract context, "/users/{id}" server span)
//!     → users.rs (count request, "getUser" span, reply)
//! ```

pub mod client;
pub mod middleware;
pub mod server;
pub mod users;

pub use client::{ClientError, ClientResponse, TracedClient};
pub use server::{AppState, DemoServer};
pub use users::get_user;

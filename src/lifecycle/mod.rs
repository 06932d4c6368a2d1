//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (each binary):
//!     Load config → Init logging → Init telemetry → Start work
//!
//! Shutdown:
//!     Signal received (signals.rs) → Shutdown::trigger (shutdown.rs)
//!     → server stops accepting, drains → Telemetry::shutdown → Exit
//! ```
//!
//! # Design Decisions
//! - Telemetry is drained last so spans from the final requests are kept
//! - Telemetry drain has a timeout: exit proceeds after the deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{spawn_signal_listener, wait_for_signal};

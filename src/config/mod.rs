//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DemoConfig (validated, immutable)
//!     → CLI flags override individual fields in each binary
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so every binary runs without a file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, validated, ConfigError};
pub use schema::{
    ClientConfig, DemoConfig, ExporterEndpoint, LogFormat, MetricsConfig, MetricsExporterKind,
    MonolithConfig, ObservabilityConfig, ServerConfig, TelemetryConfig, TracesConfig,
};
pub use validation::{validate_config, ValidationError};

//! Logging setup for Gantry applications.
//!
//! Request logging itself happens in the `logger` middleware through
//! `tracing`; this crate installs the subscriber that formats it.
//!
//! # Example
//!
//! ```rust,no_run
//! use gantry_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development()).expect("logging");
//! tracing::info!(route = "/ping", "ready");
//! ```

#![doc(html_root_url = "https://docs.rs/gantry-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

//! Typed configuration for Gantry applications.
//!
//! - TOML and JSON files with strict field checking
//! - Environment overrides named `GANTRY__SECTION__KEY`
//! - `.env` files via `dotenvy`
//! - Conversion into [`gantry_server::ServerConfig`] and
//!   [`gantry_telemetry::LogConfig`]
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! templates = "templates/**/*.html"
//!
//! [[server.static_dirs]]
//! url_path = "/assets"
//! root = "./public"
//!
//! [logging]
//! level = "info,gantry_server=debug"
//! format = "json"
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gantry_config::ConfigLoader;
//!
//! # fn main() -> Result<(), gantry_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("gantry.toml")?
//!     .with_env_prefix("GANTRY")
//!     .load()?;
//!
//! let server = config.server_config();
//! println!("listening on {}", server.http_addr());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{GantryConfig, LoggingSection, ServerSection, StaticDirSection};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};

//! # Gantry
//!
//! A small HTTP toolkit built around middleware chains.
//!
//! Every request runs one flat list of handlers: the middleware of the root
//! group, then of each nested group, then the route's own handlers. Any
//! handler can stop the chain with `abort`, or wrap the rest of it by calling
//! `advance` and doing more work once it returns.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gantry::prelude::*;
//!
//! fn require_token(c: &mut Context) {
//!     if c.request_headers().get("authorization").is_none() {
//!         c.abort(StatusCode::UNAUTHORIZED);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new()
//!         .with_optional_file("gantry.toml")?
//!         .with_env_prefix("GANTRY")
//!         .load()?;
//!     init_logging(&config.log_config())?;
//!
//!     let server_config = config.server_config();
//!     let mut engine = Engine::from_config(&server_config)?;
//!     engine.get("/ping", [handler(|c| c.string(StatusCode::OK, "pong"))]);
//!
//!     let mut api = engine.group("/api", [handler(require_token)]);
//!     api.get("/items", [handler(|c| c.json(StatusCode::OK, &["bolt", "nut"]))]);
//!
//!     engine.into_app().serve_config(&server_config).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! - [`core`] - Context, handler chains and the response writer
//! - [`router`] - The path tree
//! - [`server`] - Engine, groups, middleware and serving
//! - [`config`] - File and environment configuration
//! - [`telemetry`] - Log subscriber setup

#![doc(html_root_url = "https://docs.rs/gantry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use gantry_config as config;
pub use gantry_core as core;
pub use gantry_router as router;
pub use gantry_server as server;
pub use gantry_telemetry as telemetry;

pub use gantry_core::handler;

/// Prelude module for convenient imports.
///
/// ```rust
/// use gantry::prelude::*;
///
/// let mut engine = Engine::new();
/// engine.get("/", [handler(|c| c.string(StatusCode::OK, "home"))]);
/// ```
pub mod prelude {
    pub use gantry_config::{ConfigLoader, GantryConfig};
    pub use gantry_core::{
        handler, Context, CoreError, ErrorRecord, Handler, HandlerChain, Validate,
        ValidationError,
    };
    pub use gantry_server::{
        logger, recovery, App, Engine, RouterGroup, ServerConfig, ServerError, StaticFiles,
        Templates,
    };
    pub use gantry_telemetry::{init_logging, LogConfig};

    pub use http::{HeaderValue, Method, StatusCode};
}

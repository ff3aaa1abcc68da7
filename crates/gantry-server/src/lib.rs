//! # Gantry Server
//!
//! Route groups, the engine and HTTP serving for the Gantry toolkit.
//!
//! - [`Engine`] - Root group, route table, not-found chain and templates
//! - [`RouterGroup`] - Path prefix plus middleware shared by its routes
//! - [`App`] - The frozen engine: dispatches requests and serves them over TCP
//! - [`StaticFiles`] / [`Templates`] - File serving and HTML rendering
//! - [`logger`] / [`recovery`] - Built-in middleware
//!
//! ## Example
//!
//! ```rust,no_run
//! use gantry_server::{handler, Engine};
//! use http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gantry_server::ServerError> {
//!     let mut engine = Engine::with_defaults();
//!     engine.get("/ping", [handler(|c| c.string(StatusCode::OK, "pong"))]);
//!
//!     let mut api = engine.group("/api", []);
//!     api.get("/users/:id", [handler(|c| {
//!         let id = c.param("id").unwrap_or_default().to_string();
//!         c.json(StatusCode::OK, &serde_json::json!({ "id": id }));
//!     })]);
//!
//!     engine.run("127.0.0.1:8080").await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/gantry-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod config;
mod engine;
mod error;
mod group;
mod middleware;
mod server;
mod shutdown;
mod static_files;
mod templates;

pub use app::{App, ClientAddr, METHOD_NOT_ALLOWED_BODY, NOT_FOUND_BODY};
pub use config::{
    ServerConfig, ServerConfigBuilder, StaticMount, DEFAULT_HTTP_ADDR, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use engine::Engine;
pub use error::{ServerError, ServerResult, StaticFileError, TemplateError};
pub use group::{join_paths, GroupId, RouterGroup};
pub use middleware::{logger, recovery};
pub use shutdown::{ConnectionGuard, ConnectionTracker, Shutdown};
pub use static_files::{Served, StaticFiles, FILEPATH_PARAM};
pub use templates::Templates;

pub use gantry_core::{
    handler, Context, CoreError, ErrorRecord, Handler, HandlerChain, Renderer, Request, Response,
    Validate, ValidationError,
};
pub use gantry_router::RouteError;

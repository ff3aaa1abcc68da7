//! Server configuration.
//!
//! ```rust
//! use gantry_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .http_addr("127.0.0.1:3000")
//!     .templates("templates/*.html")
//!     .static_dir("/assets", "./public")
//!     .shutdown_timeout(Duration::from_secs(5))
//!     .build();
//!
//! assert_eq!(config.http_addr(), "127.0.0.1:3000");
//! assert_eq!(config.static_dirs().len(), 1);
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ServerError;

/// Default HTTP bind address.
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// A directory served under a URL prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticMount {
    /// URL prefix, e.g. `/assets`.
    pub url_path: String,
    /// Directory on disk.
    pub root: PathBuf,
}

/// Server configuration.
///
/// Use [`ServerConfig::builder()`] to construct instances.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    http_addr: String,
    shutdown_timeout: Duration,
    templates: Option<String>,
    static_dirs: Vec<StaticMount>,
}

impl ServerConfig {
    /// Creates a builder with default values.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// The HTTP bind address as configured.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Parses the bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        parse_addr(&self.http_addr)
    }

    /// How long to wait for in-flight connections on shutdown.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Glob pattern for HTML templates, if any.
    #[must_use]
    pub fn templates(&self) -> Option<&str> {
        self.templates.as_deref()
    }

    /// Static directory mounts.
    #[must_use]
    pub fn static_dirs(&self) -> &[StaticMount] {
        &self.static_dirs
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    http_addr: String,
    shutdown_timeout: Duration,
    templates: Option<String>,
    static_dirs: Vec<StaticMount>,
}

impl ServerConfigBuilder {
    /// Creates a builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            templates: None,
            static_dirs: Vec::new(),
        }
    }

    /// Sets the HTTP bind address, e.g. `"127.0.0.1:3000"`.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = addr.into();
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Sets the template glob pattern.
    #[must_use]
    pub fn templates(mut self, pattern: impl Into<String>) -> Self {
        self.templates = Some(pattern.into());
        self
    }

    /// Adds a static directory mount.
    #[must_use]
    pub fn static_dir(mut self, url_path: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.static_dirs.push(StaticMount {
            url_path: url_path.into(),
            root: root.into(),
        });
        self
    }

    /// Builds the [`ServerConfig`].
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            http_addr: self.http_addr,
            shutdown_timeout: self.shutdown_timeout,
            templates: self.templates,
            static_dirs: self.static_dirs,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn parse_addr(addr: &str) -> Result<SocketAddr, ServerError> {
    addr.parse().map_err(|e: std::net::AddrParseError| ServerError::InvalidAddress {
        addr: addr.to_string(),
        reason: e.to_string(),
    })
}

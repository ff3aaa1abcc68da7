//! Configuration file schema.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use gantry_server::{ServerConfig, DEFAULT_HTTP_ADDR, DEFAULT_SHUTDOWN_TIMEOUT_SECS};
use gantry_telemetry::{create_env_filter, LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Complete application configuration.
///
/// ```
/// use gantry_config::GantryConfig;
///
/// let config = GantryConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct GantryConfig {
    /// `[server]` section.
    #[serde(default)]
    pub server: ServerSection,

    /// `[logging]` section.
    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ServerSection {
    /// Bind address.
    pub http_addr: String,

    /// Seconds to wait for open connections on shutdown.
    pub shutdown_timeout_secs: u64,

    /// Glob pattern for HTML templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<String>,

    /// Directories served as static files.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub static_dirs: Vec<StaticDirSection>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            templates: None,
            static_dirs: Vec::new(),
        }
    }
}

/// One `[[server.static_dirs]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StaticDirSection {
    /// URL prefix.
    pub url_path: String,
    /// Directory on disk.
    pub root: PathBuf,
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingSection {
    /// Whether to install a subscriber.
    pub enabled: bool,

    /// `EnvFilter` directive.
    pub level: String,

    /// `json`, `pretty` or `compact`.
    pub format: LogFormat,

    /// Log span open/close events.
    pub span_events: bool,

    /// Include file and line.
    pub file_line_info: bool,

    /// Service name on the startup line.
    pub service_name: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self::from(LogConfig::production())
    }
}

impl From<LogConfig> for LoggingSection {
    fn from(config: LogConfig) -> Self {
        Self {
            enabled: config.enabled,
            level: config.level,
            format: config.format,
            span_events: config.span_events,
            file_line_info: config.file_line_info,
            service_name: config.service_name,
        }
    }
}

impl GantryConfig {
    /// Human-readable debug logging, bound to localhost.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerSection {
                http_addr: "127.0.0.1:8080".to_string(),
                ..ServerSection::default()
            },
            logging: LoggingSection::from(LogConfig::development()),
        }
    }

    /// JSON logging at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Checks values that deserialization alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if matches!(&self.server.templates, Some(pattern) if pattern.trim().is_empty()) {
            return Err(ConfigError::invalid(
                "server.templates",
                "must not be empty when set",
            ));
        }

        for (i, dir) in self.server.static_dirs.iter().enumerate() {
            if !dir.url_path.starts_with('/') {
                return Err(ConfigError::invalid(
                    format!("server.static_dirs[{i}].url_path"),
                    format!("must start with '/': {}", dir.url_path),
                ));
            }
        }

        if self.logging.enabled {
            create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Server settings for `gantry-server`.
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        let section = &self.server;
        let mut builder = ServerConfig::builder()
            .http_addr(section.http_addr.clone())
            .shutdown_timeout(Duration::from_secs(section.shutdown_timeout_secs));
        if let Some(pattern) = &section.templates {
            builder = builder.templates(pattern.clone());
        }
        for dir in &section.static_dirs {
            builder = builder.static_dir(dir.url_path.clone(), dir.root.clone());
        }
        builder.build()
    }

    /// Logging settings for `gantry-telemetry`.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let section = &self.logging;
        LogConfig {
            enabled: section.enabled,
            level: section.level.clone(),
            format: section.format,
            span_events: section.span_events,
            file_line_info: section.file_line_info,
            service_name: section.service_name.clone(),
            ..LogConfig::production()
        }
    }
}

//! Errors from loading and validating configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Why a [`ConfigLoader`](crate::ConfigLoader) gave up.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `with_file` was given a path that does not exist.
    #[error("config file {} does not exist", path.display())]
    Missing {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// The file exists but reading it failed.
    #[error("cannot read config file {}", path.display())]
    Read {
        /// The file being read.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Only `toml` and `json` are understood.
    #[error("unsupported config format `{0}` (expected toml or json)")]
    UnsupportedFormat(String),

    /// Malformed TOML, or TOML that does not fit [`GantryConfig`](crate::GantryConfig).
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON, or JSON that does not fit [`GantryConfig`](crate::GantryConfig).
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// A value parsed but is not acceptable.
    #[error("{field}: {reason}")]
    Invalid {
        /// Dotted path of the offending key, e.g. `server.http_addr`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override variable held a value of the wrong shape.
    #[error("environment variable {var}: {reason}")]
    Env {
        /// Full variable name.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// The `.env` file exists but could not be parsed.
    #[error("cannot load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// The dotted key this error is about, when it concerns one value.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }
}

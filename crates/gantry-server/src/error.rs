//! Error types for the server crate.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`ServerError`].
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors raised while configuring or running the server.
///
/// Per-request failures never surface here; they are recorded on the
/// request's context.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("invalid address '{addr}': {reason}")]
    InvalidAddress {
        /// Address as configured.
        addr: String,
        /// Parser message.
        reason: String,
    },

    /// Binding the listener failed.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// Address that could not be bound.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// I/O error on the listener.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Templates could not be loaded.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Errors raised while loading templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The glob pattern is malformed.
    #[error("invalid template pattern '{pattern}': {source}")]
    Pattern {
        /// Pattern as given.
        pattern: String,
        /// Glob parser error.
        #[source]
        source: glob::PatternError,
    },

    /// The pattern matched no files.
    #[error("template pattern '{0}' matched no files")]
    NoMatches(String),

    /// A matched path could not be read.
    #[error("failed to read template {path}: {source}")]
    Read {
        /// Path of the template file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A template does not parse.
    #[error("failed to parse template '{name}': {source}")]
    Syntax {
        /// Template name.
        name: String,
        /// Template engine error.
        #[source]
        source: minijinja::Error,
    },
}

/// Errors raised while serving a static file.
#[derive(Debug, Error)]
pub enum StaticFileError {
    /// The requested file was not found.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The path is forbidden (traversal or hidden file).
    #[error("forbidden path: {0}")]
    Forbidden(String),

    /// Only GET and HEAD are served.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// I/O error while reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StaticFileError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

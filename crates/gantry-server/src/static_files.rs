//! Static file serving.
//!
//! [`StaticFiles`] serves files below a root directory, with support for:
//!
//! - Index file fallback (`index.html`)
//! - Weak `ETag` validators and `If-None-Match`
//! - MIME type detection
//! - Protection against directory traversal and hidden files
//!
//! It is mounted on an engine with
//! [`Engine::serve_static`](crate::Engine::serve_static), which registers a
//! `*filepath` route so the root middleware runs in front of it.
//!
//! # Example
//!
//! ```rust
//! use gantry_server::StaticFiles;
//!
//! let files = StaticFiles::new("./public")
//!     .index("index.html")
//!     .cache_control("max-age=3600");
//! ```

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use gantry_core::{handler, Context, Handler};
use http::header::{self, HeaderMap, HeaderValue};
use http::{Method, StatusCode};

use crate::error::StaticFileError;

/// Name of the route parameter holding the requested file path.
pub const FILEPATH_PARAM: &str = "filepath";

/// Static file server configuration and handler.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    /// Root directory for static files
    root: PathBuf,

    /// Index file name (e.g., "index.html")
    index_file: Option<String>,

    /// Cache-Control header value
    cache_control: Option<String>,

    /// Whether to serve hidden files (starting with .)
    serve_hidden: bool,
}

/// A file ready to be written to the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Served {
    /// File contents.
    File {
        /// File bytes.
        body: Bytes,
        /// Detected content type.
        content_type: &'static str,
        /// Weak validator for the file.
        etag: Option<String>,
    },
    /// The client's cached copy is current.
    NotModified {
        /// Validator the client sent.
        etag: String,
    },
}

impl StaticFiles {
    /// Creates a file server for `root` with `index.html` as index file.
    #[must_use]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            index_file: Some("index.html".to_string()),
            cache_control: None,
            serve_hidden: false,
        }
    }

    /// Sets the index file served for directory requests.
    #[must_use]
    pub fn index<S: Into<String>>(mut self, index: S) -> Self {
        self.index_file = Some(index.into());
        self
    }

    /// Disables index files; directory requests become 404.
    #[must_use]
    pub fn no_index(mut self) -> Self {
        self.index_file = None;
        self
    }

    /// Sets the Cache-Control header value for responses.
    #[must_use]
    pub fn cache_control<S: Into<String>>(mut self, value: S) -> Self {
        self.cache_control = Some(value.into());
        self
    }

    /// Allows serving files whose name starts with a dot.
    #[must_use]
    pub fn serve_hidden(mut self, enabled: bool) -> Self {
        self.serve_hidden = enabled;
        self
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves and reads `request_path` relative to the root.
    pub fn load(
        &self,
        request_path: &str,
        headers: &HeaderMap,
        method: &Method,
    ) -> Result<Served, StaticFileError> {
        if method != Method::GET && method != Method::HEAD {
            return Err(StaticFileError::MethodNotAllowed);
        }

        let mut path = self.resolve_path(request_path)?;
        if path.is_dir() {
            match &self.index_file {
                Some(index) if path.join(index).is_file() => path = path.join(index),
                _ => return Err(StaticFileError::NotFound(request_path.to_string())),
            }
        }

        let metadata = std::fs::metadata(&path)?;
        let etag = etag_for(&metadata);

        if let (Some(etag), Some(sent)) = (&etag, headers.get(header::IF_NONE_MATCH)) {
            let matches = sent
                .to_str()
                .is_ok_and(|value| value.split(',').any(|v| v.trim() == etag || v.trim() == "*"));
            if matches {
                return Ok(Served::NotModified { etag: etag.clone() });
            }
        }

        let body = if method == Method::HEAD {
            Bytes::new()
        } else {
            Bytes::from(std::fs::read(&path)?)
        };

        Ok(Served::File {
            body,
            content_type: mime_type(&path),
            etag,
        })
    }

    /// Serves the file named by the `filepath` route parameter.
    pub fn serve(&self, c: &mut Context) {
        let request_path = c.param(FILEPATH_PARAM).unwrap_or("").to_string();
        let outcome = self.load(&request_path, c.request_headers(), c.method());

        if let Some(value) = self
            .cache_control
            .as_deref()
            .and_then(|v| HeaderValue::from_str(v).ok())
        {
            c.header(header::CACHE_CONTROL, value);
        }

        match outcome {
            Ok(Served::File {
                body,
                content_type,
                etag,
            }) => {
                if let Some(value) = etag.and_then(|e| HeaderValue::from_str(&e).ok()) {
                    c.header(header::ETAG, value);
                }
                c.data(StatusCode::OK, content_type, &body);
            }
            Ok(Served::NotModified { etag }) => {
                if let Ok(value) = HeaderValue::from_str(&etag) {
                    c.header(header::ETAG, value);
                }
                c.status(StatusCode::NOT_MODIFIED);
            }
            Err(err) => {
                tracing::debug!(path = %request_path, error = %err, "static file not served");
                let status = err.status_code();
                let text = match status {
                    StatusCode::NOT_FOUND => "404 page not found",
                    StatusCode::FORBIDDEN => "403 forbidden",
                    StatusCode::METHOD_NOT_ALLOWED => "405 method not allowed",
                    _ => "500 internal server error",
                };
                c.string(status, text);
            }
        }
    }

    /// Wraps the file server as a handler.
    #[must_use]
    pub fn into_handler(self) -> Handler {
        let files = Arc::new(self);
        handler(move |c| files.serve(c))
    }

    /// Maps a request path to a file below the root.
    fn resolve_path(&self, request_path: &str) -> Result<PathBuf, StaticFileError> {
        let relative = request_path.trim_start_matches('/');

        for component in Path::new(relative).components() {
            match component {
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StaticFileError::Forbidden(request_path.to_string()));
                }
                Component::Normal(name) => {
                    if !self.serve_hidden && name.to_string_lossy().starts_with('.') {
                        return Err(StaticFileError::Forbidden(request_path.to_string()));
                    }
                }
                Component::CurDir => {}
            }
        }

        let full_path = self.root.join(relative);
        let canonical = full_path
            .canonicalize()
            .map_err(|_| StaticFileError::NotFound(request_path.to_string()))?;
        let canonical_root = self.root.canonicalize()?;

        // Symlinks may still point outside the root.
        if !canonical.starts_with(&canonical_root) {
            return Err(StaticFileError::Forbidden(request_path.to_string()));
        }

        Ok(canonical)
    }
}

/// Weak validator built from modification time and size.
fn etag_for(metadata: &std::fs::Metadata) -> Option<String> {
    let modified = metadata.modified().ok()?;
    let since_epoch = modified.duration_since(SystemTime::UNIX_EPOCH).ok()?;
    Some(format!(
        "W/\"{:x}-{:x}\"",
        since_epoch.as_secs(),
        metadata.len()
    ))
}

/// Detects the MIME type for a file.
fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",

        // Other
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        "webmanifest" => "application/manifest+json",

        _ => "application/octet-stream",
    }
}

//! Response wrapper with observable status.
//!
//! Handlers never talk to the transport directly. They write into a
//! [`ResponseWriter`], which remembers whether a status has been committed so
//! that later writers (an `abort`, the default 404 body, the panic boundary)
//! can tell that a response already exists.

use bytes::{Bytes, BytesMut};
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;

/// The HTTP response type produced by a finished context.
pub type Response = http::Response<Full<Bytes>>;

/// Buffered response sink for one request.
///
/// The status is first-writer-wins: once a status has been committed, later
/// calls to [`write_header`](Self::write_header) are ignored.
///
/// ```
/// use gantry_core::ResponseWriter;
/// use http::StatusCode;
///
/// let mut w = ResponseWriter::new();
/// assert!(!w.written());
///
/// assert!(w.write_header(StatusCode::CREATED));
/// assert!(!w.write_header(StatusCode::BAD_REQUEST));
/// assert_eq!(w.status(), 201);
/// ```
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseWriter {
    /// Creates an unwritten response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits the response status.
    ///
    /// Returns `true` if this call set the status, `false` if a status had
    /// already been committed and this one was dropped.
    pub fn write_header(&mut self, status: StatusCode) -> bool {
        if self.status.is_some() {
            tracing::trace!(
                attempted = status.as_u16(),
                committed = self.status(),
                "status already written"
            );
            return false;
        }
        self.status = Some(status);
        true
    }

    /// Appends bytes to the body.
    ///
    /// Writing a body commits `200 OK` if no status was set yet, the same
    /// way a raw transport would flush an implicit status line.
    pub fn write(&mut self, data: &[u8]) -> usize {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
        data.len()
    }

    /// Returns the committed status code, or `0` if none was written.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status.map_or(0, |s| s.as_u16())
    }

    /// Returns the committed status, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns true once a status has been committed.
    #[must_use]
    pub fn written(&self) -> bool {
        self.status.is_some()
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers.
    ///
    /// Headers stay editable after the status is committed; they are only
    /// flushed when the response is converted.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets `Content-Type` unless a handler already chose one.
    pub fn default_content_type(&mut self, value: &'static str) {
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(value));
        }
    }

    /// Body bytes written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Number of body bytes written so far.
    #[must_use]
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// Converts into an HTTP response. An unwritten response becomes `200 OK`
    /// with an empty body.
    #[must_use]
    pub fn into_response(self) -> Response {
        let mut response = http::Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

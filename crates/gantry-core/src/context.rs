//! Per-request context and chain execution.
//!
//! A [`Context`] is created for every request that reaches a handler chain.
//! It owns the request, the [`ResponseWriter`], the error list, the route
//! parameters and a cursor into the chain. Handlers receive `&mut Context`
//! and decide whether the chain continues.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use gantry_router::Params;
use http::header::{HeaderMap, HeaderValue, IntoHeaderName};
use http::{Method, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ABORTED_META;
use crate::handler::{Handler, HandlerChain, ABORT_INDEX};
use crate::{CoreError, ErrorRecord, Renderer, ResponseWriter, Validate};

/// The request type seen by handlers. The body is fully buffered.
pub type Request = http::Request<Bytes>;

type AnyBox = Box<dyn Any + Send + Sync>;

/// Per-request state threaded through a handler chain.
///
/// # Chain execution
///
/// The cursor starts before the first handler. [`advance`](Self::advance)
/// runs handlers until the chain is exhausted or the context is aborted. A
/// handler may call `advance` itself to run the rest of the chain and then
/// continue its own work afterwards:
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use gantry_core::{handler, Context, HandlerChain};
///
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let (l1, l2) = (log.clone(), log.clone());
///
/// let chain = HandlerChain::new(vec![
///     handler(move |c: &mut Context| {
///         l1.lock().unwrap().push("before");
///         c.advance();
///         l1.lock().unwrap().push("after");
///     }),
///     handler(move |_c: &mut Context| l2.lock().unwrap().push("handler")),
/// ]);
///
/// let mut ctx = Context::for_chain(chain);
/// ctx.advance();
/// assert_eq!(*log.lock().unwrap(), ["before", "handler", "after"]);
/// ```
pub struct Context {
    request: Request,
    writer: ResponseWriter,
    params: Params,
    handlers: HandlerChain,
    index: i8,
    errors: Vec<ErrorRecord>,
    keys: Option<HashMap<String, AnyBox>>,
    extensions: HashMap<TypeId, AnyBox>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl Context {
    /// Creates a context positioned before the first handler of `handlers`.
    #[must_use]
    pub fn new(request: Request, params: Params, handlers: HandlerChain) -> Self {
        Self {
            request,
            writer: ResponseWriter::new(),
            params,
            handlers,
            index: -1,
            errors: Vec::new(),
            keys: None,
            extensions: HashMap::new(),
            renderer: None,
        }
    }

    /// Creates a context for an empty `GET /` request.
    ///
    /// Mostly useful in tests of individual handlers.
    #[must_use]
    pub fn for_chain(handlers: HandlerChain) -> Self {
        Self::new(Request::default(), Params::new(), handlers)
    }

    /// Attaches the template renderer used by [`html`](Self::html).
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    // ------------------------------------------------------------------
    // Chain control
    // ------------------------------------------------------------------

    /// Runs the remaining handlers in order.
    ///
    /// Re-entrant: the cursor is shared, so when a nested call returns the
    /// outer loop resumes from wherever the nested call stopped and no
    /// handler runs twice. After [`abort`](Self::abort) the cursor sits past
    /// the end of any chain and nothing else runs.
    pub fn advance(&mut self) {
        self.step();
        while let Some(next) = self.current() {
            next(self);
            self.step();
        }
    }

    /// Moves the cursor one position, stopping at the chain length. An
    /// aborted cursor stays at [`ABORT_INDEX`].
    fn step(&mut self) {
        if self.is_aborted() {
            return;
        }
        // Chains are capped at MAX_CHAIN_LEN, so the length fits in i8.
        let len = i8::try_from(self.handlers.len()).unwrap_or(i8::MAX);
        if self.index < len {
            self.index += 1;
        }
    }

    fn current(&self) -> Option<Handler> {
        let position = usize::try_from(self.index).ok()?;
        self.handlers.get(position).cloned()
    }

    /// Commits `status` (unless a status is already written) and stops the
    /// chain. Calling it again has no further effect.
    pub fn abort(&mut self, status: StatusCode) {
        self.writer.write_header(status);
        if !self.is_aborted() {
            tracing::debug!(status = status.as_u16(), index = self.index, "handler chain aborted");
        }
        self.index = ABORT_INDEX;
    }

    /// Returns true once [`abort`](Self::abort) or [`fail`](Self::fail) ran.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.index == ABORT_INDEX
    }

    /// Current cursor position: `-1` before start, the chain length once
    /// exhausted, [`ABORT_INDEX`] once aborted.
    #[must_use]
    pub fn cursor(&self) -> i8 {
        self.index
    }

    /// The chain this context is executing.
    #[must_use]
    pub fn handlers(&self) -> &HandlerChain {
        &self.handlers
    }

    // ------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------

    /// Appends an error record. Does not touch the cursor.
    pub fn record_error(&mut self, err: impl fmt::Display, meta: serde_json::Value) {
        self.errors.push(ErrorRecord::new(err.to_string(), meta));
    }

    /// Records `err` and aborts with `status`.
    pub fn fail(&mut self, status: StatusCode, err: impl fmt::Display) {
        self.record_error(err, serde_json::Value::from(ABORTED_META));
        self.abort(status);
    }

    /// Errors recorded so far, oldest first.
    #[must_use]
    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    /// Most recently recorded error.
    #[must_use]
    pub fn last_error(&self) -> Option<&ErrorRecord> {
        self.errors.last()
    }

    // ------------------------------------------------------------------
    // Key-value store
    // ------------------------------------------------------------------

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.keys
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), Box::new(value));
    }

    /// Returns the value under `key` if it exists and has type `T`.
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.keys.as_ref()?.get(key)?.downcast_ref()
    }

    /// Returns the value under `key`, for values an earlier handler is
    /// required to have set.
    ///
    /// # Panics
    ///
    /// Panics if `key` was never set or holds a value of another type.
    #[must_use]
    pub fn must_get<T: Any>(&self, key: &str) -> &T {
        let Some(value) = self.keys.as_ref().and_then(|keys| keys.get(key)) else {
            panic!("key \"{key}\" does not exist");
        };
        match value.downcast_ref() {
            Some(value) => value,
            None => panic!(
                "key \"{key}\" does not hold a {}",
                std::any::type_name::<T>()
            ),
        }
    }

    /// Removes and returns the value under `key` if it has type `T`.
    ///
    /// A value of another type is left in place.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        let keys = self.keys.as_mut()?;
        if !keys.get(key)?.is::<T>() {
            return None;
        }
        keys.remove(key)?.downcast().ok().map(|boxed| *boxed)
    }

    /// Returns true if a value is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.as_ref().is_some_and(|keys| keys.contains_key(key))
    }

    // ------------------------------------------------------------------
    // Typed extensions
    // ------------------------------------------------------------------

    /// Stores a value keyed by its type.
    pub fn insert_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns the extension of type `T`.
    #[must_use]
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    /// Returns the extension of type `T` mutably.
    pub fn extension_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.extensions
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut())
    }

    /// Removes and returns the extension of type `T`.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast().ok())
            .map(|boxed| *boxed)
    }

    // ------------------------------------------------------------------
    // Request
    // ------------------------------------------------------------------

    /// The request being served.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// Request headers.
    #[must_use]
    pub fn request_headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// Buffered request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    /// Route parameters captured by the matched path template.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// A single route parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Decodes the JSON body into `T`, then validates it.
    ///
    /// Validation only runs when decoding succeeded.
    pub fn parse_body<T>(&self) -> Result<T, CoreError>
    where
        T: DeserializeOwned + Validate,
    {
        let value: T = serde_json::from_slice(self.request.body())?;
        value.validate(self)?;
        Ok(value)
    }

    /// Like [`parse_body`](Self::parse_body), but fails the request with
    /// `400 Bad Request` on error.
    ///
    /// Returns `None` after failing so the handler can return early:
    ///
    /// ```
    /// use gantry_core::{Context, Validate};
    /// use serde::Deserialize;
    /// use http::StatusCode;
    ///
    /// #[derive(Deserialize)]
    /// struct Login { user: String }
    /// impl Validate for Login {}
    ///
    /// fn login(c: &mut Context) {
    ///     let Some(body) = c.ensure_body::<Login>() else { return };
    ///     c.string(StatusCode::OK, &format!("hello {}", body.user));
    /// }
    /// # let _ = login;
    /// ```
    pub fn ensure_body<T>(&mut self) -> Option<T>
    where
        T: DeserializeOwned + Validate,
    {
        match self.parse_body() {
            Ok(value) => Some(value),
            Err(err) => {
                self.fail(StatusCode::BAD_REQUEST, err);
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Response
    // ------------------------------------------------------------------

    /// The response writer.
    #[must_use]
    pub fn writer(&self) -> &ResponseWriter {
        &self.writer
    }

    /// The response writer, mutably.
    pub fn writer_mut(&mut self) -> &mut ResponseWriter {
        &mut self.writer
    }

    /// Commits a status without a body.
    pub fn status(&mut self, status: StatusCode) {
        self.writer.write_header(status);
    }

    /// Sets a response header.
    pub fn header<K: IntoHeaderName>(&mut self, name: K, value: HeaderValue) {
        self.writer.headers_mut().insert(name, value);
    }

    /// Writes a plain-text response.
    pub fn string(&mut self, status: StatusCode, text: &str) {
        self.data(status, "text/plain; charset=utf-8", text.as_bytes());
    }

    /// Serializes `value` as a JSON response.
    ///
    /// A serialization failure is recorded and the request fails with 500.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(body) => self.data(status, "application/json", &body),
            Err(err) => self.fail(StatusCode::INTERNAL_SERVER_ERROR, err),
        }
    }

    /// Writes raw bytes with the given content type.
    pub fn data(&mut self, status: StatusCode, content_type: &'static str, body: &[u8]) {
        self.writer.default_content_type(content_type);
        self.writer.write_header(status);
        self.writer.write(body);
    }

    /// Renders a loaded template with `data` as an HTML response.
    ///
    /// Fails the request with 500 if no templates are loaded or rendering
    /// fails.
    pub fn html<T: Serialize + ?Sized>(&mut self, status: StatusCode, name: &str, data: &T) {
        let rendered = match &self.renderer {
            None => Err(CoreError::NoTemplates),
            Some(renderer) => serde_json::to_value(data)
                .map_err(|err| CoreError::render(name, err))
                .and_then(|value| renderer.render(name, &value)),
        };
        match rendered {
            Ok(page) => self.data(status, "text/html; charset=utf-8", page.as_bytes()),
            Err(err) => self.fail(StatusCode::INTERNAL_SERVER_ERROR, err),
        }
    }

    /// Finishes the request, producing the HTTP response.
    #[must_use]
    pub fn into_response(self) -> crate::Response {
        self.writer.into_response()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("params", &self.params)
            .field("handlers", &self.handlers)
            .field("index", &self.index)
            .field("status", &self.writer.status())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

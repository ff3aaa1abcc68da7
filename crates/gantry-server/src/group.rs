//! Router groups.
//!
//! A group contributes a path prefix and a middleware list to every route
//! registered under it, including routes of nested groups. Groups live in an
//! arena owned by the [`Engine`]; a [`RouterGroup`] is a short-lived handle
//! that borrows the engine mutably while routes are being registered.

use gantry_core::Handler;
use gantry_router::RouteError;
use http::Method;

use crate::Engine;

/// Identifies a group inside its engine.
///
/// Ids stay valid for the lifetime of the engine, so a group can be
/// reopened later with [`Engine::router_group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    /// The engine's root group.
    pub const ROOT: Self = Self(0);
}

/// Handle to a group while routes are registered.
///
/// ```
/// use gantry_server::{Engine, handler};
/// use http::StatusCode;
///
/// let auth = handler(|c| {
///     if c.request_headers().get("authorization").is_none() {
///         c.abort(StatusCode::UNAUTHORIZED);
///     }
/// });
///
/// let mut engine = Engine::new();
/// let mut api = engine.group("/api", [auth]);
/// api.get("/items", [handler(|c| c.string(StatusCode::OK, "[]"))]);
///
/// let mut v2 = api.group("v2", []);
/// assert_eq!(v2.prefix(), "/api/v2");
/// v2.get("/items", [handler(|c| c.string(StatusCode::OK, "[]"))]);
/// ```
pub struct RouterGroup<'e> {
    engine: &'e mut Engine,
    id: GroupId,
}

impl<'e> RouterGroup<'e> {
    pub(crate) fn new(engine: &'e mut Engine, id: GroupId) -> Self {
        Self { engine, id }
    }

    /// This group's id.
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// This group's full path prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.engine.group_prefix(self.id)
    }

    /// Appends middleware to this group.
    ///
    /// Only routes registered afterwards see the new middleware: chains are
    /// flattened when a route is registered.
    pub fn use_middleware(&mut self, middleware: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.engine.extend_group(self.id, middleware);
        self
    }

    /// Creates a child group whose prefix is this prefix joined with
    /// `component` and whose own middleware is `middleware`.
    pub fn group(
        &mut self,
        component: &str,
        middleware: impl IntoIterator<Item = Handler>,
    ) -> RouterGroup<'_> {
        let child = self.engine.add_group(self.id, component, middleware);
        RouterGroup::new(&mut *self.engine, child)
    }

    /// Returns the ancestor middleware of this group, outermost first,
    /// followed by `handlers`.
    #[must_use]
    pub fn resolve_full_chain(&self, handlers: impl IntoIterator<Item = Handler>) -> Vec<Handler> {
        self.engine.resolve_full_chain(self.id, handlers)
    }

    /// Registers `handlers` for `method` at this prefix joined with `path`.
    ///
    /// # Panics
    ///
    /// Panics if the route is already registered, its template is malformed,
    /// or the flattened chain is too long. Use
    /// [`try_handle`](Self::try_handle) to get the routing error instead.
    pub fn handle(
        &mut self,
        method: Method,
        path: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> &mut Self {
        if let Err(err) = self.try_handle(method, path, handlers) {
            panic!("{err}");
        }
        self
    }

    /// Like [`handle`](Self::handle), but returns routing errors.
    pub fn try_handle(
        &mut self,
        method: Method,
        path: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<&mut Self, RouteError> {
        self.engine.register(self.id, method, path, handlers)?;
        Ok(self)
    }

    /// Registers a GET route.
    pub fn get(&mut self, path: &str, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.handle(Method::GET, path, handlers)
    }

    /// Registers a POST route.
    pub fn post(&mut self, path: &str, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.handle(Method::POST, path, handlers)
    }

    /// Registers a PUT route.
    pub fn put(&mut self, path: &str, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.handle(Method::PUT, path, handlers)
    }

    /// Registers a PATCH route.
    pub fn patch(&mut self, path: &str, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.handle(Method::PATCH, path, handlers)
    }

    /// Registers a DELETE route.
    pub fn delete(&mut self, path: &str, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.handle(Method::DELETE, path, handlers)
    }

    /// Registers a HEAD route. GET routes already answer HEAD.
    pub fn head(&mut self, path: &str, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.handle(Method::HEAD, path, handlers)
    }

    /// Registers an OPTIONS route.
    pub fn options(&mut self, path: &str, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.handle(Method::OPTIONS, path, handlers)
    }
}

impl std::fmt::Debug for RouterGroup<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterGroup")
            .field("id", &self.id)
            .field("prefix", &self.prefix())
            .finish()
    }
}

/// Joins a prefix and a relative path the way URL paths nest.
///
/// Empty and `.` segments are dropped, `..` removes the previous segment,
/// and the result always starts with `/` and never ends with one.
#[must_use]
pub fn join_paths(prefix: &str, relative: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in prefix.split('/').chain(relative.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

//! The engine: root group, route table and not-found chain.
//!
//! An [`Engine`] is mutable while the application is configured. Calling
//! [`Engine::into_app`] freezes it into an [`App`] that is shared read-only
//! by every connection.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use gantry_core::{Handler, HandlerChain};
use gantry_router::{RouteError, Router};
use http::Method;

use crate::app::App;
use crate::config::ServerConfig;
use crate::error::{ServerError, TemplateError};
use crate::group::{join_paths, GroupId, RouterGroup};
use crate::middleware::{logger, recovery};
use crate::static_files::{StaticFiles, FILEPATH_PARAM};
use crate::templates::Templates;

/// One node of the group tree.
struct GroupData {
    prefix: String,
    handlers: Vec<Handler>,
    parent: Option<GroupId>,
}

impl fmt::Debug for GroupData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupData")
            .field("prefix", &self.prefix)
            .field("handlers", &self.handlers.len())
            .field("parent", &self.parent)
            .finish()
    }
}

/// Application builder.
///
/// The engine owns the root [`RouterGroup`]; its route-registration methods
/// apply to the root group.
///
/// # Example
///
/// ```rust
/// use gantry_server::{handler, Engine};
/// use http::StatusCode;
///
/// let mut engine = Engine::with_defaults();
/// engine.get("/ping", [handler(|c| c.string(StatusCode::OK, "pong"))]);
///
/// let app = engine.into_app();
/// # let _ = app;
/// ```
pub struct Engine {
    groups: Vec<GroupData>,
    router: Router<HandlerChain>,
    not_found: Vec<Handler>,
    templates: Option<Templates>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("groups", &self.groups)
            .field("routes", &self.router.len())
            .field("not_found", &self.not_found.len())
            .field("templates", &self.templates.as_ref().map(Templates::names))
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: vec![GroupData {
                prefix: "/".to_string(),
                handlers: Vec::new(),
                parent: None,
            }],
            router: Router::new(),
            not_found: Vec::new(),
            templates: None,
        }
    }

    /// Creates an engine whose root group runs the request logger and panic
    /// recovery middleware.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.use_middleware([logger(), recovery()]);
        engine
    }

    /// Creates an engine with defaults and applies `config`: templates are
    /// loaded and static directories mounted.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let mut engine = Self::with_defaults();
        if let Some(pattern) = config.templates() {
            engine.load_templates(pattern)?;
        }
        for mount in config.static_dirs() {
            engine.serve_static(&mount.url_path, &mount.root);
        }
        Ok(engine)
    }

    /// Handle to the root group.
    pub fn root(&mut self) -> RouterGroup<'_> {
        RouterGroup::new(self, GroupId::ROOT)
    }

    /// Reopens a group created earlier on this engine.
    pub fn router_group(&mut self, id: GroupId) -> Option<RouterGroup<'_>> {
        if id.0 < self.groups.len() {
            Some(RouterGroup::new(self, id))
        } else {
            None
        }
    }

    /// Appends middleware to the root group.
    pub fn use_middleware(&mut self, middleware: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.extend_group(GroupId::ROOT, middleware);
        self
    }

    /// Creates a group below the root.
    pub fn group(
        &mut self,
        component: &str,
        middleware: impl IntoIterator<Item = Handler>,
    ) -> RouterGroup<'_> {
        let id = self.add_group(GroupId::ROOT, component, middleware);
        RouterGroup::new(self, id)
    }

    /// Registers a route on the root group. See [`RouterGroup::handle`].
    pub fn handle(
        &mut self,
        method: Method,
        path: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> &mut Self {
        self.root().handle(method, path, handlers);
        self
    }

    /// Registers a GET route on the root group.
    pub fn get(&mut self, path: &str, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.handle(Method::GET, path, handlers)
    }

    /// Registers a POST route on the root group.
    pub fn post(&mut self, path: &str, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.handle(Method::POST, path, handlers)
    }

    /// Registers a PUT route on the root group.
    pub fn put(&mut self, path: &str, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.handle(Method::PUT, path, handlers)
    }

    /// Registers a PATCH route on the root group.
    pub fn patch(&mut self, path: &str, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.handle(Method::PATCH, path, handlers)
    }

    /// Registers a DELETE route on the root group.
    pub fn delete(&mut self, path: &str, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.handle(Method::DELETE, path, handlers)
    }

    /// Registers a HEAD route on the root group.
    pub fn head(&mut self, path: &str, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.handle(Method::HEAD, path, handlers)
    }

    /// Registers an OPTIONS route on the root group.
    pub fn options(&mut self, path: &str, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.handle(Method::OPTIONS, path, handlers)
    }

    /// Sets the handlers run when no route matches.
    ///
    /// They run after the root middleware. If nothing has been written once
    /// the chain finishes, the default `404 page not found` is sent.
    pub fn not_found(&mut self, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.not_found = handlers.into_iter().collect();
        self
    }

    /// Loads HTML templates from a glob pattern.
    ///
    /// Replaces previously loaded templates.
    pub fn load_templates(&mut self, pattern: &str) -> Result<&mut Self, TemplateError> {
        self.templates = Some(Templates::from_glob(pattern)?);
        Ok(self)
    }

    /// Uses an already built template set.
    pub fn set_templates(&mut self, templates: Templates) -> &mut Self {
        self.templates = Some(templates);
        self
    }

    /// Serves files below `root` at `url_path` on the root group.
    ///
    /// Registers `GET {url_path}` (the directory index) and
    /// `GET {url_path}/*filepath`; both also answer HEAD.
    pub fn serve_static(&mut self, url_path: &str, root: impl Into<PathBuf>) -> &mut Self {
        self.mount_static(url_path, StaticFiles::new(root.into()))
    }

    /// Like [`serve_static`](Self::serve_static) with a configured
    /// [`StaticFiles`].
    pub fn mount_static(&mut self, url_path: &str, files: StaticFiles) -> &mut Self {
        let files = files.into_handler();
        let wildcard = join_paths(url_path, &format!("*{FILEPATH_PARAM}"));
        self.get(url_path, [files.clone()]);
        self.get(&wildcard, [files]);
        self
    }

    /// Number of (method, path) routes registered.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.router.len()
    }

    /// Freezes the engine into a servable [`App`].
    ///
    /// The not-found chain is flattened here, against the root middleware
    /// as it stands at this point.
    #[must_use]
    pub fn into_app(self) -> App {
        let not_found =
            HandlerChain::new(self.resolve_full_chain(GroupId::ROOT, self.not_found.clone()));
        let root_only = HandlerChain::new(self.resolve_full_chain(GroupId::ROOT, []));
        tracing::debug!(
            routes = self.router.len(),
            groups = self.groups.len(),
            templates = self.templates.as_ref().map_or(0, Templates::len),
            "engine frozen"
        );
        App::new(
            self.router,
            not_found,
            root_only,
            self.templates.map(Arc::new),
        )
    }

    /// Freezes the engine and serves it on `addr` until Ctrl-C.
    pub async fn run(self, addr: &str) -> Result<(), ServerError> {
        self.into_app().serve(addr).await
    }

    // ------------------------------------------------------------------
    // Group arena
    // ------------------------------------------------------------------

    pub(crate) fn group_prefix(&self, id: GroupId) -> &str {
        &self.groups[id.0].prefix
    }

    pub(crate) fn extend_group(&mut self, id: GroupId, middleware: impl IntoIterator<Item = Handler>) {
        self.groups[id.0].handlers.extend(middleware);
    }

    pub(crate) fn add_group(
        &mut self,
        parent: GroupId,
        component: &str,
        middleware: impl IntoIterator<Item = Handler>,
    ) -> GroupId {
        let prefix = join_paths(&self.groups[parent.0].prefix, component);
        self.groups.push(GroupData {
            prefix,
            handlers: middleware.into_iter().collect(),
            parent: Some(parent),
        });
        GroupId(self.groups.len() - 1)
    }

    /// Concatenates the middleware of `id` and its ancestors, outermost
    /// first, followed by `handlers`.
    pub(crate) fn resolve_full_chain(
        &self,
        id: GroupId,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Vec<Handler> {
        let mut lineage = Vec::new();
        let mut current = Some(id);
        while let Some(group) = current {
            let data = &self.groups[group.0];
            lineage.push(&data.handlers);
            current = data.parent;
        }

        lineage
            .into_iter()
            .rev()
            .flatten()
            .cloned()
            .chain(handlers)
            .collect()
    }

    pub(crate) fn register(
        &mut self,
        id: GroupId,
        method: Method,
        path: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<(), RouteError> {
        let full_path = join_paths(&self.groups[id.0].prefix, path);
        let chain = HandlerChain::new(self.resolve_full_chain(id, handlers));
        tracing::debug!(%method, path = %full_path, handlers = chain.len(), "route registered");
        self.router.route(&method, &full_path, chain)
    }
}

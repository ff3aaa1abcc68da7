//! High-level router API.
//!
//! This module provides the main [`Router`] struct which is the primary
//! interface for building and matching routes.

use http::Method;

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;
use crate::RouteMatch;

/// A radix tree router mapping `(method, path)` to a value of type `T`.
///
/// # Example
///
/// ```rust
/// use gantry_router::{Router, MethodRouter};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert("/items", MethodRouter::new().get("list").post("create")).unwrap();
/// router.insert("/items/:id", MethodRouter::new().get("show")).unwrap();
///
/// let found = router.match_route(&Method::GET, "/items/7").unwrap();
/// assert_eq!(*found.value, "show");
/// assert_eq!(found.params.get("id"), Some("7"));
/// ```
///
/// # Route Priority
///
/// When multiple routes could match, the router uses the following priority:
///
/// 1. **Static segments** (e.g., `/users/me`)
/// 2. **Parameter segments** (e.g., `/users/{id}`)
/// 3. **Wildcard segments** (e.g., `/files/*path`)
#[derive(Debug, Clone)]
pub struct Router<T> {
    /// Root node of the radix tree
    root: Node<T>,
    /// Number of (method, path) bindings registered
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts every binding of `methods` under `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] when the template is malformed or one of
    /// the methods is already bound for the same path.
    pub fn insert(&mut self, path: &str, methods: MethodRouter<T>) -> Result<(), RouteError> {
        let added = methods.allowed_methods().len();
        self.root.insert(path, methods)?;
        self.route_count += added;
        Ok(())
    }

    /// Convenience method to add a single-method route.
    ///
    /// ```rust
    /// use gantry_router::Router;
    /// use http::Method;
    ///
    /// let mut router = Router::new();
    /// router.route(&Method::GET, "/health", 1).unwrap();
    /// assert_eq!(router.len(), 1);
    /// ```
    pub fn route(&mut self, method: &Method, path: &str, value: T) -> Result<(), RouteError> {
        self.insert(path, MethodRouter::new().method(method, value))
    }

    /// Matches a method and path, returning the bound value and parameters.
    ///
    /// HEAD requests fall back to the GET binding when no HEAD binding
    /// exists for the path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let (methods, params) = self.root.match_path(path)?;
        let value = methods.resolve(method)?;
        Some(RouteMatch::new(value, params))
    }

    /// Matches a path against the router (without method).
    ///
    /// Useful for checking allowed methods or generating 405 responses.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        self.root.match_path(path)
    }

    /// Returns the number of (method, path) bindings registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

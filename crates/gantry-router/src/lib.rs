//! Radix tree router for Gantry.
//!
//! This crate is the path-matching layer underneath the Gantry engine. It
//! maps a `(method, path)` pair to a caller-chosen value (the engine stores
//! resolved handler chains) and captures named segments along the way.
//!
//! # Features
//!
//! - **Radix Tree Matching**: lookup cost grows with path length, not route count
//! - **Path Parameters**: `/users/{id}` or `/users/:id`
//! - **Wildcards**: catch-all tails (`/files/*filepath`)
//! - **Method-Based Routing**: one value per method per path, HEAD falls back to GET
//! - **Registration Checks**: duplicate bindings and malformed templates are rejected
//!
//! # Example
//!
//! ```rust
//! use gantry_router::{Router, MethodRouter};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert("/users", MethodRouter::new().get("listUsers").post("createUser")).unwrap();
//! router.insert("/users/{id}", MethodRouter::new().get("getUser")).unwrap();
//! router.insert("/files/*path", MethodRouter::new().get("serveFile")).unwrap();
//!
//! let route_match = router.match_route(&Method::GET, "/users/123").unwrap();
//! assert_eq!(*route_match.value, "getUser");
//! assert_eq!(route_match.params.get("id"), Some("123"));
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐        "*path"
//!        │           │
//!       (leaf)    "{id}"
//!   [GET,POST]      │
//!                 (leaf)
//!                 [GET]
//! ```

#![forbid(unsafe_code)]

mod error;
mod method_router;
mod node;
mod params;
mod router;

pub use error::RouteError;
pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::Router;

/// A matched route with its bound value and extracted parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value bound to the matched (method, path)
    pub value: &'a T,
    /// Extracted path parameters
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(value: &'a T, params: Params) -> Self {
        Self { value, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_basic_routing() {
        let mut router = Router::new();
        router.insert("/items", MethodRouter::new().get("list")).unwrap();
        router.insert("/items/{id}", MethodRouter::new().get("show")).unwrap();

        let m = router.match_route(&Method::GET, "/items").unwrap();
        assert_eq!(*m.value, "list");
        assert!(m.params.is_empty());

        let m = router.match_route(&Method::GET, "/items/123").unwrap();
        assert_eq!(*m.value, "show");
        assert_eq!(m.params.get("id"), Some("123"));
    }

    #[test]
    fn test_wildcard_routing() {
        let mut router = Router::new();
        router.insert("/static/*filepath", MethodRouter::new().get("files")).unwrap();

        let m = router.match_route(&Method::GET, "/static/css/site.css").unwrap();
        assert_eq!(*m.value, "files");
        assert_eq!(m.params.get("filepath"), Some("css/site.css"));
    }

    #[test]
    fn test_no_match() {
        let mut router = Router::new();
        router.insert("/items", MethodRouter::new().get("list")).unwrap();
        assert!(router.match_route(&Method::GET, "/unknown").is_none());
    }

    #[test]
    fn test_deeply_nested_params() {
        let mut router = Router::new();
        router
            .insert("/api/v1/orgs/{org}/items/{item}", MethodRouter::new().get("orgItem"))
            .unwrap();

        let m = router.match_route(&Method::GET, "/api/v1/orgs/acme/items/9").unwrap();
        assert_eq!(*m.value, "orgItem");
        assert_eq!(m.params.get("org"), Some("acme"));
        assert_eq!(m.params.get("item"), Some("9"));
    }
}

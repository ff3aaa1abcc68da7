//! HTTP method-based routing.
//!
//! This module provides [`MethodRouter`] which maps HTTP methods to route
//! values for a single path. Any method token is accepted, including
//! extension methods that have no dedicated constant in [`http::Method`].

use http::Method;
use smallvec::SmallVec;

/// Number of method bindings stored inline per path.
const INLINE_METHODS: usize = 4;

/// Maps HTTP methods to route values for a single path.
///
/// # Example
///
/// ```rust
/// use gantry_router::MethodRouter;
/// use http::Method;
///
/// let router = MethodRouter::new()
///     .get("listItems")
///     .post("createItem");
///
/// assert_eq!(router.get_value(&Method::GET), Some(&"listItems"));
/// assert_eq!(router.get_value(&Method::POST), Some(&"createItem"));
/// assert_eq!(router.get_value(&Method::DELETE), None);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    entries: SmallVec<[(Method, T); INLINE_METHODS]>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates a new empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a GET binding.
    #[must_use]
    pub fn get(self, value: T) -> Self {
        self.method(&Method::GET, value)
    }

    /// Registers a POST binding.
    #[must_use]
    pub fn post(self, value: T) -> Self {
        self.method(&Method::POST, value)
    }

    /// Registers a PUT binding.
    #[must_use]
    pub fn put(self, value: T) -> Self {
        self.method(&Method::PUT, value)
    }

    /// Registers a DELETE binding.
    #[must_use]
    pub fn delete(self, value: T) -> Self {
        self.method(&Method::DELETE, value)
    }

    /// Registers a PATCH binding.
    #[must_use]
    pub fn patch(self, value: T) -> Self {
        self.method(&Method::PATCH, value)
    }

    /// Registers a binding for an arbitrary method.
    ///
    /// A later binding for the same method replaces the earlier one; use
    /// [`MethodRouter::merge`] when overwriting must be detected.
    #[must_use]
    pub fn method(mut self, method: &Method, value: T) -> Self {
        if let Some(slot) = self.entries.iter_mut().find(|(m, _)| m == method) {
            slot.1 = value;
        } else {
            self.entries.push((method.clone(), value));
        }
        self
    }

    /// Returns the value bound to the exact method.
    #[must_use]
    pub fn get_value(&self, method: &Method) -> Option<&T> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, v)| v)
    }

    /// Returns the value for `method`, letting HEAD fall back to GET.
    #[must_use]
    pub fn resolve(&self, method: &Method) -> Option<&T> {
        self.get_value(method).or_else(|| {
            if *method == Method::HEAD {
                self.get_value(&Method::GET)
            } else {
                None
            }
        })
    }

    /// Merges another method router into this one.
    ///
    /// Methods already bound here are kept; the methods of `other` that
    /// collided are returned so the caller can report them.
    ///
    /// ```rust
    /// use gantry_router::MethodRouter;
    /// use http::Method;
    ///
    /// let mut router = MethodRouter::new().get(1);
    /// let clashes = router.merge(MethodRouter::new().get(2).post(3));
    ///
    /// assert_eq!(clashes, vec![Method::GET]);
    /// assert_eq!(router.get_value(&Method::GET), Some(&1));
    /// assert_eq!(router.get_value(&Method::POST), Some(&3));
    /// ```
    pub fn merge(&mut self, other: MethodRouter<T>) -> Vec<Method> {
        let mut clashes = Vec::new();
        for (method, value) in other.entries {
            if self.entries.iter().any(|(m, _)| *m == method) {
                clashes.push(method);
            } else {
                self.entries.push((method, value));
            }
        }
        clashes
    }

    /// Returns true if any methods are registered.
    #[must_use]
    pub fn has_any_method(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Returns the bound methods in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_router_new() {
        let router: MethodRouter<u8> = MethodRouter::new();
        assert!(!router.has_any_method());
    }

    #[test]
    fn test_standard_methods() {
        let router = MethodRouter::new()
            .get("get")
            .post("post")
            .put("put")
            .delete("delete")
            .patch("patch");

        assert_eq!(router.get_value(&Method::GET), Some(&"get"));
        assert_eq!(router.get_value(&Method::POST), Some(&"post"));
        assert_eq!(router.get_value(&Method::PUT), Some(&"put"));
        assert_eq!(router.get_value(&Method::DELETE), Some(&"delete"));
        assert_eq!(router.get_value(&Method::PATCH), Some(&"patch"));
        assert_eq!(router.get_value(&Method::OPTIONS), None);
    }

    #[test]
    fn test_extension_method() {
        let purge = Method::from_bytes(b"PURGE").unwrap();
        let router = MethodRouter::new().method(&purge, 7);
        assert_eq!(router.get_value(&purge), Some(&7));
    }

    #[test]
    fn test_method_replaces_same_method() {
        let router = MethodRouter::new().get(1).get(2);
        assert_eq!(router.get_value(&Method::GET), Some(&2));
        assert_eq!(router.allowed_methods(), vec![Method::GET]);
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let router = MethodRouter::new().get("page");
        assert_eq!(router.resolve(&Method::HEAD), Some(&"page"));
        assert_eq!(router.get_value(&Method::HEAD), None);
        assert_eq!(router.resolve(&Method::POST), None);
    }

    #[test]
    fn test_explicit_head_wins() {
        let router = MethodRouter::new().get("page").method(&Method::HEAD, "probe");
        assert_eq!(router.resolve(&Method::HEAD), Some(&"probe"));
    }

    #[test]
    fn test_merge_reports_clashes() {
        let mut router = MethodRouter::new().get("original");
        let clashes = router.merge(MethodRouter::new().get("new").delete("remove"));

        assert_eq!(clashes, vec![Method::GET]);
        assert_eq!(router.get_value(&Method::GET), Some(&"original"));
        assert_eq!(router.get_value(&Method::DELETE), Some(&"remove"));
    }

    #[test]
    fn test_allowed_methods_in_registration_order() {
        let router = MethodRouter::new().post(1).get(2).delete(3);
        assert_eq!(
            router.allowed_methods(),
            vec![Method::POST, Method::GET, Method::DELETE]
        );
    }
}

//! Route registration errors.

use http::Method;
use thiserror::Error;

/// A path template that cannot be added to the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The method is already bound for this path.
    #[error("route {method} {path} is already registered")]
    Duplicate {
        /// Method that was bound twice.
        method: Method,
        /// Path template of the second registration.
        path: String,
    },

    /// A parameter segment reuses a position under a different name.
    #[error("parameter '{requested}' in {path} conflicts with existing parameter '{existing}'")]
    ParamConflict {
        /// Path template being registered.
        path: String,
        /// Name already present in the tree.
        existing: String,
        /// Name requested by the new template.
        requested: String,
    },

    /// A `*wildcard` segment is followed by more segments.
    #[error("wildcard must be the last segment in {0}")]
    WildcardNotLast(String),

    /// A `{}` / `:` / `*` segment has no name.
    #[error("unnamed parameter in {0}")]
    EmptyName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_display() {
        let err = RouteError::Duplicate {
            method: Method::GET,
            path: "/items".to_string(),
        };
        assert_eq!(err.to_string(), "route GET /items is already registered");
    }

    #[test]
    fn test_wildcard_display() {
        let err = RouteError::WildcardNotLast("/a/*b/c".to_string());
        assert_eq!(err.to_string(), "wildcard must be the last segment in /a/*b/c");
    }
}

//! Radix tree node implementation.
//!
//! Each node owns one path segment. Route values live in a
//! [`MethodRouter`] attached to the node where a registered path ends.

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::params::Params;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g., "users", "api")
    Static,
    /// Named parameter (`{id}` or `:id`)
    Param(String),
    /// Catch-all wildcard (e.g., "*filepath")
    Wildcard(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// The path segment this node represents
    pub segment: String,

    /// The kind of segment (static, param, or wildcard)
    pub kind: SegmentKind,

    /// Method bindings for this node (if a route ends here)
    pub methods: Option<MethodRouter<T>>,

    /// Static children, sorted by segment for binary search
    pub static_children: Vec<Node<T>>,

    /// Parameter child (at most one per node)
    pub param_child: Option<Box<Node<T>>>,

    /// Wildcard child (at most one per node, always a leaf)
    pub wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a new static node.
    #[must_use]
    pub fn new_static(segment: impl Into<String>) -> Self {
        Self::with_kind(segment.into(), SegmentKind::Static)
    }

    /// Creates a new parameter node.
    #[must_use]
    pub fn new_param(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!("{{{name}}}"), SegmentKind::Param(name))
    }

    /// Creates a new wildcard node.
    #[must_use]
    pub fn new_wildcard(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!("*{name}"), SegmentKind::Wildcard(name))
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new_static("")
    }

    /// Inserts a route into the tree.
    pub fn insert(&mut self, path: &str, methods: MethodRouter<T>) -> Result<(), RouteError> {
        let segments = parse_path(path)?;
        self.insert_segments(path, &segments, methods)
    }

    fn insert_segments(
        &mut self,
        path: &str,
        segments: &[(String, SegmentKind)],
        methods: MethodRouter<T>,
    ) -> Result<(), RouteError> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            return self.attach(path, methods);
        };

        match kind {
            SegmentKind::Static => {
                let idx = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment.as_str()))
                {
                    Ok(idx) => idx,
                    Err(idx) => {
                        self.static_children.insert(idx, Node::new_static(segment.as_str()));
                        idx
                    }
                };
                self.static_children[idx].insert_segments(path, remaining, methods)
            }
            SegmentKind::Param(name) => {
                let child = self
                    .param_child
                    .get_or_insert_with(|| Box::new(Node::new_param(name.as_str())));
                if let SegmentKind::Param(existing) = &child.kind {
                    if existing != name {
                        return Err(RouteError::ParamConflict {
                            path: path.to_string(),
                            existing: existing.clone(),
                            requested: name.clone(),
                        });
                    }
                }
                child.insert_segments(path, remaining, methods)
            }
            SegmentKind::Wildcard(name) => {
                let child = self
                    .wildcard_child
                    .get_or_insert_with(|| Box::new(Node::new_wildcard(name.as_str())));
                if let SegmentKind::Wildcard(existing) = &child.kind {
                    if existing != name {
                        return Err(RouteError::ParamConflict {
                            path: path.to_string(),
                            existing: existing.clone(),
                            requested: name.clone(),
                        });
                    }
                }
                child.attach(path, methods)
            }
        }
    }

    fn attach(&mut self, path: &str, methods: MethodRouter<T>) -> Result<(), RouteError> {
        match &mut self.methods {
            Some(existing) => {
                let clashes = existing.merge(methods);
                match clashes.into_iter().next() {
                    Some(method) => Err(RouteError::Duplicate {
                        method,
                        path: path.to_string(),
                    }),
                    None => Ok(()),
                }
            }
            None => {
                self.methods = Some(methods);
                Ok(())
            }
        }
    }

    /// Matches a path against the tree.
    ///
    /// Returns the method bindings and extracted parameters if found.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
    ) -> Option<&'a MethodRouter<T>> {
        let Some((&segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), segment);
                if let Some(found) = child.match_segments(remaining, params) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                params.push(name.clone(), segments.join("/"));
                return child.methods.as_ref();
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

/// Splits a path template into typed segments.
fn parse_path(path: &str) -> Result<Vec<(String, SegmentKind)>, RouteError> {
    let raw: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let last = raw.len().saturating_sub(1);

    raw.iter()
        .enumerate()
        .map(|(i, s)| {
            let kind = if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                SegmentKind::Param(name.to_string())
            } else if let Some(name) = s.strip_prefix(':') {
                SegmentKind::Param(name.to_string())
            } else if let Some(name) = s.strip_prefix('*') {
                if i != last {
                    return Err(RouteError::WildcardNotLast(path.to_string()));
                }
                SegmentKind::Wildcard(name.to_string())
            } else {
                SegmentKind::Static
            };

            match &kind {
                SegmentKind::Param(name) | SegmentKind::Wildcard(name) if name.is_empty() => {
                    Err(RouteError::EmptyName(path.to_string()))
                }
                _ => Ok(((*s).to_string(), kind)),
            }
        })
        .collect()
}

//! Route parameters captured during a match.
//!
//! Most routes carry one to four parameters, so pairs are kept inline in a
//! small vector and only spill to the heap for unusually deep templates.

use smallvec::SmallVec;

/// Maximum number of parameters stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// Named values captured from `{name}`, `:name` and `*name` segments.
///
/// Pairs keep the order in which the segments appear in the path.
///
/// ```rust
/// use gantry_router::Params;
///
/// let mut params = Params::new();
/// params.push("org", "acme");
/// params.push("filepath", "css/site.css");
///
/// assert_eq!(params.get("org"), Some("acme"));
/// assert_eq!(params.get("filepath"), Some("css/site.css"));
/// assert_eq!(params.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    pairs: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates a new empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a captured parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Returns the first value captured under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Drops every pair past the first `len`.
    ///
    /// Used by the matcher to undo captures from a branch that failed.
    pub fn truncate(&mut self, len: usize) {
        self.pairs.truncate(len);
    }

    /// Returns an iterator over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect(),
        }
    }
}

//! Handlers and handler chains.
//!
//! A [`Handler`] is a synchronous function over a mutable [`Context`]. Routes
//! and router groups collect handlers into a [`HandlerChain`], which is
//! flattened once at registration time and shared by every request that
//! matches the route.

use std::fmt;
use std::sync::Arc;

use crate::Context;

/// Cursor value that marks a context as aborted.
///
/// Strictly greater than any chain length a [`HandlerChain`] accepts, so an
/// aborted context never finds another handler to run.
pub const ABORT_INDEX: i8 = i8::MAX / 2;

/// Longest chain (middleware plus route handlers) that can be registered.
pub const MAX_CHAIN_LEN: usize = (ABORT_INDEX - 1) as usize;

/// A unit of request processing.
///
/// Handlers are reference counted so the same middleware can appear in many
/// chains without being cloned.
pub type Handler = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Wraps a closure or function as a [`Handler`].
///
/// ```
/// use gantry_core::{handler, Context};
/// use http::StatusCode;
///
/// let ping = handler(|c: &mut Context| c.string(StatusCode::OK, "pong"));
/// # let _ = ping;
/// ```
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// An immutable, flattened sequence of handlers.
///
/// Cloning is cheap: all clones share one allocation.
#[derive(Clone)]
pub struct HandlerChain(Arc<[Handler]>);

impl HandlerChain {
    /// Freezes `handlers` into a chain.
    ///
    /// # Panics
    ///
    /// Panics if the chain is longer than [`MAX_CHAIN_LEN`]. Chains are built
    /// while routes are registered, so this surfaces at startup.
    #[must_use]
    pub fn new(handlers: Vec<Handler>) -> Self {
        assert!(
            handlers.len() <= MAX_CHAIN_LEN,
            "handler chain has {} handlers, at most {MAX_CHAIN_LEN} are supported",
            handlers.len()
        );
        Self(Arc::from(handlers))
    }

    /// An empty chain.
    #[must_use]
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// Number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the chain has no handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Handler at `index`, if in bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Handler> {
        self.0.get(index)
    }

    /// Iterates the handlers in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &Handler> {
        self.0.iter()
    }
}

impl Default for HandlerChain {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Handler>> for HandlerChain {
    fn from(handlers: Vec<Handler>) -> Self {
        Self::new(handlers)
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("len", &self.0.len())
            .finish()
    }
}

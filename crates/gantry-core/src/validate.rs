//! Validation and rendering seams.
//!
//! Both are consumed by [`Context`] but implemented elsewhere: validation by
//! the application's body types, rendering by the template engine the server
//! loads at startup.

use crate::{Context, CoreError, ValidationError};

/// Post-decode validation for request bodies.
///
/// The default implementation accepts every value, so a body type opts in
/// with an empty `impl Validate for T {}` and overrides `validate` when it
/// has constraints. The context is available for checks that depend on
/// request state such as route parameters or values set by middleware.
///
/// ```
/// use gantry_core::{Context, Validate, ValidationError};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct NewItem {
///     name: String,
/// }
///
/// impl Validate for NewItem {
///     fn validate(&self, _ctx: &Context) -> Result<(), ValidationError> {
///         if self.name.trim().is_empty() {
///             return Err(ValidationError::field("name", "must not be blank"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validate {
    /// Checks the decoded value.
    fn validate(&self, ctx: &Context) -> Result<(), ValidationError> {
        let _ = ctx;
        Ok(())
    }
}

impl Validate for serde_json::Value {}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self, ctx: &Context) -> Result<(), ValidationError> {
        self.iter().try_for_each(|item| item.validate(ctx))
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self, ctx: &Context) -> Result<(), ValidationError> {
        self.as_ref().map_or(Ok(()), |inner| inner.validate(ctx))
    }
}

/// Renders named templates with JSON data.
pub trait Renderer: Send + Sync {
    /// Renders `name` with `data` as the template context.
    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String, CoreError>;
}

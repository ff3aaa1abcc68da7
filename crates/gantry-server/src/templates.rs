//! HTML templates.
//!
//! Templates are loaded once at startup from a glob pattern. Each matched
//! file is registered under its file name, so `views/users/show.html` is
//! rendered with `c.html(StatusCode::OK, "show.html", &data)`.

use std::fs;
use std::path::PathBuf;

use gantry_core::{CoreError, Renderer};
use minijinja::Environment;

use crate::error::TemplateError;

/// A set of parsed templates.
#[derive(Debug, Default)]
pub struct Templates {
    env: Environment<'static>,
    names: Vec<String>,
}

impl Templates {
    /// Creates an empty template set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every file matching `pattern`.
    ///
    /// Files are read in path order. When two files share a name, the later
    /// path wins.
    pub fn from_glob(pattern: &str) -> Result<Self, TemplateError> {
        let entries = glob::glob(pattern).map_err(|source| TemplateError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable template path");
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(TemplateError::NoMatches(pattern.to_string()));
        }

        let mut templates = Self::new();
        for path in paths {
            let source = fs::read_to_string(&path).map_err(|source| TemplateError::Read {
                path: path.clone(),
                source,
            })?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            templates.add(name, source)?;
        }

        tracing::info!(pattern, count = templates.len(), "templates loaded");
        Ok(templates)
    }

    /// Adds one template from source.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), TemplateError> {
        let name = name.into();
        self.env
            .add_template_owned(name.clone(), source.into())
            .map_err(|source| TemplateError::Syntax {
                name: name.clone(),
                source,
            })?;
        if !self.names.contains(&name) {
            self.names.push(name);
        }
        Ok(())
    }

    /// Returns true if a template named `name` is loaded.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Loaded template names, in load order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of loaded templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no templates are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Renderer for Templates {
    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String, CoreError> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(data))
            .map_err(|err| CoreError::render(name, err))
    }
}

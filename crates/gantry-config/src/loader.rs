//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{ConfigError, GantryConfig, StaticDirSection};

/// Default prefix for environment overrides.
pub const DEFAULT_ENV_PREFIX: &str = "GANTRY";

/// Loads a [`GantryConfig`] in layers, later layers overriding earlier ones:
///
/// 1. Built-in defaults or a preset
/// 2. A TOML or JSON file (replaces the whole configuration)
/// 3. Environment variables named `PREFIX__SECTION__KEY`
///
/// ```no_run
/// use gantry_config::ConfigLoader;
///
/// # fn main() -> Result<(), gantry_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_dotenv()?
///     .with_optional_file("gantry.toml")?
///     .with_env_prefix("GANTRY")
///     .load()?;
/// # let _ = config;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: GantryConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Starts from the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: GantryConfig::default(),
            env_prefix: None,
        }
    }

    /// Starts from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = GantryConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = GantryConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file, chosen by extension.
    ///
    /// Unknown fields are rejected. Sections missing from the file take their
    /// default values.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Missing {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        self.config = parse(&content, format)
            .map_err(|e| match e {
                ConfigError::UnsupportedFormat(_) => {
                    ConfigError::UnsupportedFormat(path.display().to_string())
                }
                other => other,
            })?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in `format` (`"toml"` or `"json"`).
    ///
    /// ```
    /// use gantry_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[server]\nhttp_addr = \"127.0.0.1:3000\"\n", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Enables environment overrides under `prefix`.
    ///
    /// With prefix `GANTRY`:
    /// - `GANTRY__SERVER__HTTP_ADDR=0.0.0.0:9000`
    /// - `GANTRY__SERVER__STATIC_DIRS=/assets=./public,/docs=./site`
    /// - `GANTRY__LOGGING__FORMAT=pretty`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads variables from a `.env` file in the working directory or its
    /// parents into the process environment. A missing file is skipped.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Applies environment overrides and validates.
    pub fn load(mut self) -> Result<GantryConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_vars(&prefix, env::vars())?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without env overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> GantryConfig {
        self.config
    }

    pub(crate) fn apply_env_vars(
        &mut self,
        prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        for (key, value) in vars {
            if let Some(path) = key.strip_prefix(&marker) {
                self.apply_env_var(&key, path, &value)?;
            }
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, path: &str, value: &str) -> Result<(), ConfigError> {
        let parts: Vec<&str> = path.split("__").collect();
        let server = &mut self.config.server;
        let logging = &mut self.config.logging;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                server.shutdown_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env(key, "expected integer"))?;
            }
            ["SERVER", "TEMPLATES"] => {
                server.templates = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            ["SERVER", "STATIC_DIRS"] => server.static_dirs = parse_static_dirs(key, value)?,

            ["LOGGING", "ENABLED"] => {
                logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = value
                    .parse()
                    .map_err(|e: gantry_telemetry::TelemetryError| {
                        ConfigError::env(key, e.to_string())
                    })?;
            }
            ["LOGGING", "SPAN_EVENTS"] => {
                logging.span_events = parse_bool(value)
                    .ok_or_else(|| ConfigError::env(key, "expected boolean"))?;
            }
            ["LOGGING", "FILE_LINE_INFO"] => {
                logging.file_line_info = parse_bool(value)
                    .ok_or_else(|| ConfigError::env(key, "expected boolean"))?;
            }
            ["LOGGING", "SERVICE_NAME"] => logging.service_name = value.to_string(),

            // Unrelated variables that share the prefix.
            _ => {}
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<GantryConfig, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Parses `url=dir` pairs separated by commas.
fn parse_static_dirs(key: &str, value: &str) -> Result<Vec<StaticDirSection>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (url_path, root) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::env(key, "expected url_path=dir pairs"))?;
            Ok(StaticDirSection {
                url_path: url_path.trim().to_string(),
                root: PathBuf::from(root.trim()),
            })
        })
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_telemetry::LogFormat;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_loader_presets() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Pretty);

        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_string_json() {
        let config = ConfigLoader::new()
            .with_string(r#"{"server": {"http_addr": "127.0.0.1:3000"}}"#, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_loader_rejects_unknown_format() {
        let err = ConfigLoader::new().with_string("", "yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ref f) if f == "yaml"));
    }

    #[test]
    fn test_loader_with_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nhttp_addr = \"127.0.0.1:4000\"\n\n[logging]\nlevel = \"warn\"").unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:4000");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_loader_with_file_wrong_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_loader_missing_files() {
        assert!(matches!(
            ConfigLoader::new().with_file("/nonexistent/gantry.toml"),
            Err(ConfigError::Missing { .. })
        ));

        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/gantry.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_env_overrides() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_vars(
                "GANTRY",
                vars(&[
                    ("GANTRY__SERVER__HTTP_ADDR", "192.168.1.1:9000"),
                    ("GANTRY__SERVER__SHUTDOWN_TIMEOUT_SECS", "3"),
                    ("GANTRY__SERVER__TEMPLATES", "views/*.html"),
                    ("GANTRY__SERVER__STATIC_DIRS", "/assets=./public, /docs = ./site"),
                    ("GANTRY__LOGGING__FORMAT", "compact"),
                    ("GANTRY__LOGGING__ENABLED", "off"),
                    ("OTHER__SERVER__HTTP_ADDR", "ignored"),
                    ("GANTRY__UNRELATED", "ignored"),
                ]),
            )
            .unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(config.server.http_addr, "192.168.1.1:9000");
        assert_eq!(config.server.shutdown_timeout_secs, 3);
        assert_eq!(config.server.templates.as_deref(), Some("views/*.html"));
        assert_eq!(config.server.static_dirs.len(), 2);
        assert_eq!(config.server.static_dirs[1].url_path, "/docs");
        assert_eq!(config.server.static_dirs[1].root, PathBuf::from("./site"));
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_env_parse_errors() {
        let mut loader = ConfigLoader::new();
        let err = loader
            .apply_env_vars("GANTRY", vars(&[("GANTRY__SERVER__SHUTDOWN_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { ref var, .. } if var == "GANTRY__SERVER__SHUTDOWN_TIMEOUT_SECS"));

        let err = loader
            .apply_env_vars("GANTRY", vars(&[("GANTRY__SERVER__STATIC_DIRS", "/assets")]))
            .unwrap_err();
        assert!(err.to_string().contains("url_path=dir"));

        let err = loader
            .apply_env_vars("GANTRY", vars(&[("GANTRY__LOGGING__FORMAT", "xml")]))
            .unwrap_err();
        assert!(err.to_string().contains("unknown log format"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("Off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}

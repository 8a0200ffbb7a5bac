//! Layered configuration loading.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults (applied by [`DispatchSettings`] itself)
//! 2. A TOML file, when one is given
//! 3. `KEEL__*` environment variables (`KEEL__DEFAULT_CONTROLLER=index`,
//!    `KEEL__ROUTING__REWRITE=...`)
//! 4. Explicit overrides
//!
//! ```toml
//! default_controller = "index"
//! default_layout = "main"
//!
//! [routing.replace]
//! "{:slug}" = "[a-z0-9-]+"
//!
//! [[routing.rewrite]]
//! from = "post/{:slug}"
//! to = "blog/show/$1"
//! ```

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde_json::Value;
use tracing::{debug, instrument};

use keel_core::{
    application::{ConfigStore, DispatchSettings, MapConfig},
    error::{KeelError, KeelResult},
};

pub const DEFAULT_ENV_PREFIX: &str = "KEEL";

/// Builds a [`MapConfig`] from file, environment and overrides.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env_prefix: Option<String>,
    overrides: Vec<(String, String)>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            file: None,
            env_prefix: Some(DEFAULT_ENV_PREFIX.into()),
            overrides: Vec::new(),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this TOML file. A missing file is an error.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Read `<PREFIX>__*` environment variables instead of `KEEL__*`.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Ignore the environment entirely.
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Force `key` (dotted for nested values) to `value`.
    pub fn set_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    #[instrument(skip(self), fields(file = ?self.file))]
    pub fn load(&self) -> KeelResult<MapConfig> {
        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        for (key, value) in &self.overrides {
            builder = builder
                .set_override(key.as_str(), value.as_str())
                .map_err(configuration)?;
        }

        let value: Value = builder
            .build()
            .map_err(configuration)?
            .try_deserialize()
            .map_err(configuration)?;

        let config = MapConfig::from_value(value);
        debug!(keys = ?config.keys(), "configuration loaded");
        Ok(config)
    }

    /// [`load`](Self::load) followed by [`DispatchSettings::from_store`].
    pub fn load_settings(&self) -> KeelResult<DispatchSettings> {
        DispatchSettings::from_store(&self.load()?)
    }
}

fn configuration(e: config::ConfigError) -> KeelError {
    KeelError::Configuration {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::domain::RouteRule;
    use keel_core::error::ErrorCategory;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    // ── helpers ───────────────────────────────────────────────────────────

    fn write_toml(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keel.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    // ── file ──────────────────────────────────────────────────────────────

    #[test]
    fn empty_loader_yields_defaults() {
        let settings = ConfigLoader::new().without_env().load_settings().unwrap();
        assert_eq!(settings, DispatchSettings::default());
    }

    #[test]
    fn reads_toml_file_with_routes() {
        let (_dir, path) = write_toml(
            r#"
default_controller = "index"
charset = "iso-8859-1"

[routing.replace]
"{:slug}" = "[a-z0-9-]+"

[[routing.rewrite]]
from = "post/{:slug}"
to = "blog/show/$1"
"#,
        );

        let settings = ConfigLoader::new()
            .without_env()
            .file(&path)
            .load_settings()
            .unwrap();

        assert_eq!(settings.default_controller.as_deref(), Some("index"));
        assert_eq!(settings.charset.as_deref(), Some("iso-8859-1"));
        assert_eq!(
            settings.routing.rewrite,
            [RouteRule::new("post/{:slug}", "blog/show/$1")]
        );
        let resolver = settings.resolver().unwrap();
        let path = vec!["post".to_string(), "hello-world".to_string()];
        assert_eq!(resolver.resolve(&path), ["blog", "show", "hello-world"]);
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let err = ConfigLoader::new()
            .without_env()
            .file("/tmp/keel_test_nonexistent_9999/keel.toml")
            .load()
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn invalid_rule_fails_settings() {
        let (_dir, path) = write_toml(
            r#"
[[routing.rewrite]]
from = "post/("
to = "blog"
"#,
        );
        let result = ConfigLoader::new().without_env().file(&path).load_settings();
        assert!(result.is_err());
    }

    // ── environment and overrides ─────────────────────────────────────────

    #[test]
    fn environment_beats_file() {
        let (_dir, path) = write_toml("default_controller = \"index\"\nmax_forward_depth = 4\n");
        unsafe { std::env::set_var("KEELTESTENV__DEFAULT_CONTROLLER", "blog") };
        let settings = ConfigLoader::new()
            .env_prefix("KEELTESTENV")
            .file(&path)
            .load_settings();
        unsafe { std::env::remove_var("KEELTESTENV__DEFAULT_CONTROLLER") };

        let settings = settings.unwrap();
        assert_eq!(settings.default_controller.as_deref(), Some("blog"));
        assert_eq!(settings.max_forward_depth, 4);
    }

    #[test]
    fn overrides_win() {
        let config = ConfigLoader::new()
            .without_env()
            .set_override("default_layout", "main")
            .load()
            .unwrap();
        assert_eq!(config.get("default_layout"), Some(json!("main")));
    }
}

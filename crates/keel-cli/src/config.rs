//! CLI configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  It only
//! covers how the CLI behaves; dispatch settings for the application live in
//! a separate TOML file read by `keel_adapters::ConfigLoader`.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. `--config FILE`
//! 3. `.keel.toml` in the current directory
//! 4. `<config dir>/keel/config.toml`
//! 5. Built-in defaults

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of the per-project CLI configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".keel.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Output settings.
    pub output: OutputConfig,
    /// Where the demo application reads settings and templates from.
    pub app: AppSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// Dispatch settings file used when `--app-config` is not given.
    pub config_file: Option<PathBuf>,
    /// Template directory used when `--views` is not given.
    pub views: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration, starting from defaults.
    ///
    /// An explicit `config_file` must exist; the implicit locations are
    /// skipped when absent.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = config_file {
            return Self::read(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Self::read(&local);
        }

        let global = Self::config_path();
        if global.is_file() {
            return Self::read(&global);
        }

        debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.keel.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "keel", "keel")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// Value at a dotted key, rendered for display.
    pub fn get(&self, key: &str) -> Option<String> {
        let display = |path: &Option<PathBuf>| {
            path.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        };
        match key {
            "output.no_color" => Some(self.output.no_color.to_string()),
            "output.format" => Some(self.output.format.clone()),
            "app.config_file" => Some(display(&self.app.config_file)),
            "app.views" => Some(display(&self.app.views)),
            _ => None,
        }
    }
}

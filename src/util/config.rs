//! Configuration file support.
//!
//! Two optional locations supply defaults for the bootstrap:
//! - Global: the platform config dir (`~/.config/funcboot/config.toml` on Linux)
//! - Project: `.funcboot/config.toml` in the project directory
//!
//! Project config takes precedence over global config. CLI flags and
//! `FUNCBOOT_*` environment variables take precedence over both.
//!
//! ```toml
//! [bootstrap]
//! module-name = "shared"
//! app-dir = "apps/function_app"
//! function-name = "http_example"
//! python-version = "3.11"
//! link = "workspace"
//! sync = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ops::bootstrap::LinkMode;

/// funcboot configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for `funcboot bootstrap`
    pub bootstrap: BootstrapSettings,
}

/// Bootstrap defaults; every field is optional and falls back to a constant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BootstrapSettings {
    pub project_name: Option<String>,
    pub module_name: Option<String>,
    pub app_dir: Option<PathBuf>,
    pub function_name: Option<String>,
    pub python_version: Option<String>,
    pub link: Option<LinkMode>,
    pub sync: Option<bool>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration, falling back to defaults if it cannot be read.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("ignoring config {}: {:#}", path.display(), e);
            Self::default()
        })
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let ours = &mut self.bootstrap;
        let theirs = other.bootstrap;

        if theirs.project_name.is_some() {
            ours.project_name = theirs.project_name;
        }
        if theirs.module_name.is_some() {
            ours.module_name = theirs.module_name;
        }
        if theirs.app_dir.is_some() {
            ours.app_dir = theirs.app_dir;
        }
        if theirs.function_name.is_some() {
            ours.function_name = theirs.function_name;
        }
        if theirs.python_version.is_some() {
            ours.python_version = theirs.python_version;
        }
        if theirs.link.is_some() {
            ours.link = theirs.link;
        }
        if theirs.sync.is_some() {
            ours.sync = theirs.sync;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.funcboot/config.toml)
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }
    config.merge(Config::load_or_default(project_path));

    config
}

//! Global context for funcboot operations.
//!
//! Resolves the project directory and the locations of the manifest and
//! configuration files.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use crate::core::manifest::MANIFEST_NAME;
use crate::util::config::{load_config, Config};

static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("", "", "funcboot"));

/// Name of the per-project configuration directory.
pub const PROJECT_CONFIG_DIR: &str = ".funcboot";

/// Paths every command works from.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Project directory holding the root manifest
    cwd: PathBuf,
}

impl GlobalContext {
    /// Context for the current working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(GlobalContext { cwd })
    }

    /// Context for an explicit project directory.
    ///
    /// Relative paths are resolved against the current directory.
    pub fn with_cwd(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let cwd = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .context("failed to get current directory")?
                .join(path)
        };
        Ok(GlobalContext { cwd })
    }

    /// The project directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Path of the root manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.cwd.join(MANIFEST_NAME)
    }

    /// Project-local config file.
    pub fn project_config_path(&self) -> PathBuf {
        self.cwd.join(PROJECT_CONFIG_DIR).join("config.toml")
    }

    /// User-wide config file, when a config dir can be determined.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        PROJECT_DIRS
            .as_ref()
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load merged global and project configuration.
    pub fn load_config(&self) -> Config {
        load_config(
            self.global_config_path().as_deref(),
            &self.project_config_path(),
        )
    }
}

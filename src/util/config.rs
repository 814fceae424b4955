//! Configuration file support for linkfold.
//!
//! linkfold reads two configuration file locations:
//! - Global: `~/.linkfold/config.toml` - User-wide defaults
//! - Project: `.linkfold/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::LinkPlanOptions;

/// linkfold configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Planning settings
    pub plan: PlanConfig,
}

/// Settings for consolidation and link planning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Fallback ancestor package (`name` or `name@version`) for diamonds
    /// with no common ancestor link boundary
    pub foundation: Option<String>,

    /// Root of the build output tree used in emitted paths
    pub out_dir: Option<PathBuf>,

    /// Target OS for library naming (linux, macos, windows)
    pub os: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.plan.foundation.is_some() {
            self.plan.foundation = other.plan.foundation;
        }
        if other.plan.out_dir.is_some() {
            self.plan.out_dir = other.plan.out_dir;
        }
        if other.plan.os.is_some() {
            self.plan.os = other.plan.os;
        }
    }

    /// Link plan options with configured values over the defaults.
    pub fn link_options(&self) -> LinkPlanOptions {
        let defaults = LinkPlanOptions::default();
        LinkPlanOptions {
            out_dir: self.plan.out_dir.clone().unwrap_or(defaults.out_dir),
            os: self.plan.os.clone().unwrap_or(defaults.os),
        }
    }
}

/// Get the global linkfold config directory (~/.linkfold).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".linkfold"))
}

/// Get the global config path (~/.linkfold/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.linkfold/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".linkfold").join("config.toml")
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.linkfold/config.toml)
/// 2. Global config (~/.linkfold/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

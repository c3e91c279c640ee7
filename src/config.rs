//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/tenancy/tenancy.toml`
//! 3. Local config: `<dir>/.tenancy.toml`
//! 4. Environment variables: `TENANCY_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Unified configuration for tenancy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Dataset file (default: `<data_dir>/tenancy.json`)
    pub data_file: PathBuf,
    /// Change log, one JSON object per line (default: `<data_dir>/changes.jsonl`)
    pub audit_log: PathBuf,
    /// Delete tenant groups together with their descendants unless the
    /// caller decides otherwise (default: false, i.e. protect)
    pub cascade_delete: bool,
}

/// Raw settings for intermediate parsing.
///
/// `None` means "not specified here, inherit from the layer below".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_file: Option<PathBuf>,
    pub audit_log: Option<PathBuf>,
    pub cascade_delete: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            data_file: data_dir.join("tenancy.json"),
            audit_log: data_dir.join("changes.jsonl"),
            cascade_delete: false,
        }
    }
}

/// Get the default data directory (XDG data dir, `~/.tenancy` as fallback).
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "tenancy")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.tenancy"))
}

/// Get the XDG config directory for tenancy.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tenancy").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("tenancy.toml"))
}

/// Get the path to the local config file in `dir`.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".tenancy.toml")
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the input unchanged.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    fn expand_paths(&mut self) {
        self.data_file = expand_path(&self.data_file);
        self.audit_log = expand_path(&self.audit_log);
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_file: overlay
                .data_file
                .clone()
                .unwrap_or_else(|| self.data_file.clone()),
            audit_log: overlay
                .audit_log
                .clone()
                .unwrap_or_else(|| self.audit_log.clone()),
            cascade_delete: overlay.cascade_delete.unwrap_or(self.cascade_delete),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `dir` - Optional directory holding a local `.tenancy.toml`
    ///
    /// Relative paths in the local config resolve against `dir`.
    pub fn load(dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let mut raw = load_raw_settings(&local_path)?;
                raw.data_file = raw.data_file.map(|p| dir.join(p));
                raw.audit_log = raw.audit_log.map(|p| dir.join(p));
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply TENANCY_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("TENANCY").try_parsing(true))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_file") {
            settings.data_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("audit_log") {
            settings.audit_log = PathBuf::from(val);
        }
        if let Ok(val) = config.get_bool("cascade_delete") {
            settings.cascade_delete = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# tenancy configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/tenancy/tenancy.toml
#   Local:  <dir>/.tenancy.toml  (relative paths resolve against <dir>)
#   Env:    TENANCY_* environment variables

# Dataset file
# data_file = "~/.local/share/tenancy/tenancy.json"

# Change log (JSON lines)
# audit_log = "~/.local/share/tenancy/changes.jsonl"

# Delete tenant groups with all descendants instead of refusing
# cascade_delete = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

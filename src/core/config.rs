//! Layered configuration
//!
//! Values are read from the user config file first and then from the
//! project's `.jpc/config.yaml`; keys present in the project file win.
//! Missing files are simply skipped.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use serde_yml::Value;
use thiserror::Error;

use crate::core::deadline::DeadlinePolicy;
use crate::core::project::Project;

/// Overrides the directory holding the user config file
pub const CONFIG_HOME_ENV: &str = "JPC_CONFIG_HOME";

const CONFIG_FILE: &str = "config.yaml";

/// Offsets outside UTC-12:00..UTC+14:00 are rejected
const MIN_OFFSET_MINUTES: i32 = -12 * 60;
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Written by `jpc init`
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Case file configuration
#
# Legal periods, in calendar days
deadlines:
  standard_days: 15
  extension_days: 15
  urgent_after_days: 10

# Local offset used to decide which month a filing belongs to
# (e.g. -300 for UTC-05:00)
numbering:
  utc_offset_minutes: 0

# Default actor recorded on extensions and status changes
# actor: secretaria
"#;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Numbering section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberingConfig {
    /// Minutes east of UTC
    pub utc_offset_minutes: i32,
}

/// Effective configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub deadlines: DeadlinePolicy,
    pub numbering: NumberingConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

impl Config {
    /// Load user config, then the project config on top of it
    pub fn load(project: Option<&Project>) -> Result<Self, ConfigError> {
        let mut paths = Vec::new();
        if let Some(user) = user_config_path() {
            paths.push(user);
        }
        if let Some(project) = project {
            paths.push(project.config_path());
        }
        Self::load_layers(&paths)
    }

    /// Merge the given files in order; later files override earlier ones
    pub fn load_layers(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut merged = Value::Null;
        for path in paths {
            if let Some(layer) = read_layer(path)? {
                tracing::debug!(path = %path.display(), "config layer loaded");
                merge(&mut merged, layer);
            }
        }

        let config: Config = if merged.is_null() {
            Config::default()
        } else {
            serde_yml::from_value(merged).map_err(|e| ConfigError::Invalid(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.deadlines.validate().map_err(ConfigError::Invalid)?;
        let minutes = self.numbering.utc_offset_minutes;
        if !(MIN_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&minutes) {
            return Err(ConfigError::Invalid(format!(
                "numbering.utc_offset_minutes must be between {} and {}, got {}",
                MIN_OFFSET_MINUTES, MAX_OFFSET_MINUTES, minutes
            )));
        }
        Ok(())
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.numbering.utc_offset_minutes * 60).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "numbering.utc_offset_minutes out of range: {}",
                self.numbering.utc_offset_minutes
            ))
        })
    }
}

/// Location of the user-level config file, if the platform has one
pub fn user_config_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_HOME_ENV) {
        return Some(PathBuf::from(dir).join(CONFIG_FILE));
    }
    directories::ProjectDirs::from("org", "jpc", "jpc")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn read_layer(path: &Path) -> Result<Option<Value>, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let value: Value = serde_yml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((!value.is_null()).then_some(value))
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

//! Configuration file schema
//!
//! The same schema is used for the global file (`~/.sdl2-interop/config.toml`)
//! and the project file (`sdl2-interop.toml`).

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of one configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Native library selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<LibrarySettings>,

    /// Diagnostics output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingSettings>,
}

/// `[library]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LibrarySettings {
    /// Explicit path to the SDL2 shared library
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Directories searched before the platform defaults
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<PathBuf>,

    /// Refuse to load libraries older than this (e.g. "2.0.10")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_version: Option<String>,
}

/// `[logging]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// One of "off", "error", "warn", "info", "debug", "trace"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl Settings {
    /// Load settings from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let settings: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate field values that the TOML schema cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(library) = &self.library {
            if let Some(version) = &library.minimum_version {
                parse_minimum_version(version)?;
            }
            if let Some(path) = &library.path {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "library.path".to_string(),
                        reason: "must not be empty".to_string(),
                    });
                }
            }
        }

        if let Some(logging) = &self.logging {
            if let Some(level) = &logging.level {
                validate_log_level("logging.level", level)?;
            }
        }

        Ok(())
    }

    /// Merge another settings value into this one.
    /// Non-None values of `other` win; search paths of `other` are searched first.
    pub fn merge(&mut self, other: &Settings) {
        match (&mut self.library, &other.library) {
            (Some(base), Some(over)) => {
                if over.path.is_some() {
                    base.path = over.path.clone();
                }
                if over.minimum_version.is_some() {
                    base.minimum_version = over.minimum_version.clone();
                }
                let mut paths = over.search_paths.clone();
                paths.extend(base.search_paths.drain(..));
                base.search_paths = paths;
            }
            (None, Some(over)) => self.library = Some(over.clone()),
            _ => {}
        }

        if let Some(over) = &other.logging {
            if over.level.is_some() {
                self.logging = Some(over.clone());
            }
        }
    }
}

/// Parse a `minimum_version` string into a semantic version
pub fn parse_minimum_version(value: &str) -> ConfigResult<semver::Version> {
    semver::Version::parse(value.trim()).map_err(|e| ConfigError::InvalidVersion(format!("{value}: {e}")))
}

pub(crate) fn validate_log_level(field: &str, value: &str) -> ConfigResult<()> {
    if !matches!(
        value.to_ascii_lowercase().as_str(),
        "off" | "error" | "warn" | "info" | "debug" | "trace"
    ) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!(
                "must be one of 'off', 'error', 'warn', 'info', 'debug', 'trace', got '{}'",
                value
            ),
        });
    }
    Ok(())
}

//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::settings::{parse_minimum_version, validate_log_level, LibrarySettings, LoggingSettings};
use crate::{ConfigError, ConfigResult, Settings, PROJECT_CONFIG_FILE};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable holding an explicit library path
pub const ENV_LIBRARY: &str = "SDL2_INTEROP_LIBRARY";
/// Environment variable holding the minimum accepted library version
pub const ENV_MIN_VERSION: &str = "SDL2_INTEROP_MIN_VERSION";
/// Environment variable holding the log level
pub const ENV_LOG: &str = "SDL2_INTEROP_LOG";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.sdl2-interop/config.toml) - lowest priority
/// 2. Project config (./sdl2-interop.toml) - overrides global
/// 3. Environment variables (SDL2_INTEROP_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteropConfig {
    /// Effective settings after merging every source
    pub settings: Settings,

    /// Directory holding the project config, if one was found
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use `path` instead of `~/.sdl2-interop/config.toml` as the global config
    pub fn with_global_config_path(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find sdl2-interop.toml, then merges it over
    /// the global config and applies environment overrides.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<InteropConfig> {
        let (project_root, project) = self.find_project_config(start_dir)?;

        let mut settings = self.load_global_config().unwrap_or_default();
        settings.merge(&project);
        let settings = self.apply_env_overrides(settings)?;

        Ok(InteropConfig {
            settings,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<InteropConfig> {
        let project = Settings::load_from_file(config_path)?;

        let mut settings = self.load_global_config().unwrap_or_default();
        settings.merge(&project);
        let settings = self.apply_env_overrides(settings)?;

        Ok(InteropConfig {
            settings,
            project_root: config_path.parent().map(|p| p.to_path_buf()),
        })
    }

    /// Find project configuration by walking up directory tree
    fn find_project_config(&self, start_dir: &Path) -> ConfigResult<(Option<PathBuf>, Settings)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let settings = Settings::load_from_file(&config_path)?;
                return Ok((Some(current), settings));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, Settings::default())),
            }
        }
    }

    /// Load global configuration from ~/.sdl2-interop/config.toml
    fn load_global_config(&mut self) -> ConfigResult<Settings> {
        if self.global_config_path.is_none() {
            self.global_config_path = Some(Self::global_config_dir()?.join("config.toml"));
        }

        let path = match &self.global_config_path {
            Some(path) => path,
            None => return Ok(Settings::default()),
        };

        // Global config is optional
        if !path.exists() {
            return Ok(Settings::default());
        }

        Settings::load_from_file(path)
    }

    /// Apply SDL2_INTEROP_* environment variables
    fn apply_env_overrides(&self, mut settings: Settings) -> ConfigResult<Settings> {
        if let Ok(path) = env::var(ENV_LIBRARY) {
            if !path.is_empty() {
                settings
                    .library
                    .get_or_insert_with(LibrarySettings::default)
                    .path = Some(PathBuf::from(path));
            }
        }

        if let Ok(version) = env::var(ENV_MIN_VERSION) {
            parse_minimum_version(&version)?;
            settings
                .library
                .get_or_insert_with(LibrarySettings::default)
                .minimum_version = Some(version);
        }

        if let Ok(level) = env::var(ENV_LOG) {
            validate_log_level(ENV_LOG, &level)?;
            settings
                .logging
                .get_or_insert_with(LoggingSettings::default)
                .level = Some(level);
        }

        Ok(settings)
    }

    /// Get the global configuration directory (~/.sdl2-interop)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".sdl2-interop"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl InteropConfig {
    /// Explicit library path, if configured
    pub fn library_path(&self) -> Option<&Path> {
        self.settings.library.as_ref().and_then(|l| l.path.as_deref())
    }

    /// Extra directories to search for the library, highest priority first
    pub fn search_paths(&self) -> &[PathBuf] {
        self.settings
            .library
            .as_ref()
            .map(|l| l.search_paths.as_slice())
            .unwrap_or(&[])
    }

    /// Minimum accepted library version
    pub fn minimum_version(&self) -> ConfigResult<Option<semver::Version>> {
        self.settings
            .library
            .as_ref()
            .and_then(|l| l.minimum_version.as_deref())
            .map(parse_minimum_version)
            .transpose()
    }

    /// Configured log level, lowercased
    pub fn log_level(&self) -> Option<String> {
        self.settings
            .logging
            .as_ref()
            .and_then(|l| l.level.as_ref())
            .map(|level| level.to_ascii_lowercase())
    }

    /// Override the library path (CLI flag)
    pub fn set_library_path(&mut self, path: impl Into<PathBuf>) {
        self.settings
            .library
            .get_or_insert_with(LibrarySettings::default)
            .path = Some(path.into());
    }

    /// Check if a project config file was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}

//! Configuration loading and config file resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SERENE_CONFIG";

/// How the number in a step's free-text duration is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnitPolicy {
    /// Honor a unit keyword after the number (`sec`, `min`, `hour`); bare numbers are minutes
    #[default]
    Detect,
    /// Every number is minutes, whatever the text says
    Minutes,
}

/// Player configuration (TOML)
///
/// All fields are optional in the file; missing ones take compiled defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Playback clock period in milliseconds
    pub tick_interval_ms: u64,
    /// Step length used when a duration cannot be parsed
    pub default_step_seconds: u32,
    /// `detect` (default) reads "4 seconds" as 4 s; `minutes` is the legacy
    /// reading where every number is minutes, so "4 seconds" lasts 240 s
    pub duration_unit: DurationUnitPolicy,
    /// Events buffered per subscriber
    pub event_bus_capacity: usize,
    /// JSON activity catalog used by the file-backed repository
    pub catalog_path: Option<PathBuf>,
    pub log_level: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            default_step_seconds: 120,
            duration_unit: DurationUnitPolicy::Detect,
            event_bus_capacity: 100,
            catalog_path: None,
            log_level: "info".to_string(),
        }
    }
}

impl PlayerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PlayerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be positive".to_string()));
        }
        if self.default_step_seconds == 0 {
            return Err(Error::Config("default_step_seconds must be positive".to_string()));
        }
        if self.event_bus_capacity == 0 {
            return Err(Error::Config("event_bus_capacity must be positive".to_string()));
        }
        Ok(())
    }
}

/// Config file resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Platform config file (`<config_dir>/serene/config.toml`)
/// 4. Compiled defaults (fallback)
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    env_var_name: String,
    platform_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self {
            env_var_name: CONFIG_ENV_VAR.to_string(),
            platform_path: default_config_path(),
        }
    }

    /// Use a different environment variable (tests, embedding hosts)
    pub fn with_env_var(mut self, name: &str) -> Self {
        self.env_var_name = name.to_string();
        self
    }

    /// Override the platform config file location
    pub fn with_platform_path(mut self, path: Option<PathBuf>) -> Self {
        self.platform_path = path;
        self
    }

    /// Pick the config file to read, if any
    pub fn resolve_path(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config file
        self.platform_path.clone().filter(|path| path.exists())
    }

    /// Resolve and load configuration
    ///
    /// A missing file is not fatal: it is logged and compiled defaults are used.
    /// A file that exists but does not parse is an error.
    pub fn load(&self, cli_arg: Option<&Path>) -> Result<PlayerConfig> {
        let Some(path) = self.resolve_path(cli_arg) else {
            debug!("No config file found, using compiled defaults");
            return Ok(PlayerConfig::default());
        };

        if !path.exists() {
            warn!("Config file {} not found, using compiled defaults", path.display());
            return Ok(PlayerConfig::default());
        }

        let config = PlayerConfig::load_file(&path)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Platform config file path (may not exist)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("serene").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.default_step_seconds, 120);
        assert_eq!(config.duration_unit, DurationUnitPolicy::Detect);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = PlayerConfig::from_toml_str("duration_unit = \"minutes\"\n").unwrap();
        assert_eq!(config.duration_unit, DurationUnitPolicy::Minutes);
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let err = PlayerConfig::from_toml_str("tick_interval_ms = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_unit_policy_rejected() {
        assert!(matches!(
            PlayerConfig::from_toml_str("duration_unit = \"fortnights\""),
            Err(Error::Toml(_))
        ));
    }
}

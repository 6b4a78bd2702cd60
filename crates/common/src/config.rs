//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MimicError, MimicResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default simulation settings used by headless drivers.
    pub simulation: SimulationDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default parameters for a headless rig simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationDefaults {
    /// Frames per second of the simulated host loop.
    pub fps: u32,

    /// Simulated duration in seconds.
    pub duration_secs: f64,

    /// Seed for the blink delay RNG. `None` draws from entropy.
    pub seed: Option<u64>,

    /// Optional rig tuning file (JSON) applied on top of engine defaults.
    pub rig_config: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "mimic_motion_core=trace,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for SimulationDefaults {
    fn default() -> Self {
        Self {
            fps: 60,
            duration_secs: 10.0,
            seed: None,
            rig_config: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> MimicResult<Self> {
        if !path.exists() {
            return Err(MimicError::file_not_found(path));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Reject values no simulation can run with.
    pub fn validate(&self) -> MimicResult<()> {
        if self.simulation.fps == 0 {
            return Err(MimicError::config("simulation.fps must be positive"));
        }
        if !(self.simulation.duration_secs >= 0.0) {
            return Err(MimicError::config(
                "simulation.duration_secs must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("mimic").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"simulation":{"fps":30,"seed":7}}"#).unwrap();
        assert_eq!(parsed.simulation.fps, 30);
        assert_eq!(parsed.simulation.seed, Some(7));
        assert_eq!(parsed.simulation.duration_secs, 10.0);
        assert_eq!(parsed.logging, LoggingConfig::default());
    }

    #[test]
    fn test_zero_fps_is_rejected() {
        let mut config = AppConfig::default();
        config.simulation.fps = 0;
        assert!(matches!(config.validate(), Err(MimicError::Config { .. })));
    }

    #[test]
    fn test_load_from_missing_file() {
        let path = std::env::temp_dir().join("mimic-config-that-does-not-exist.json");
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(MimicError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_load_from_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "mimic-config-roundtrip-{}.json",
            std::process::id()
        ));
        let mut config = AppConfig::default();
        config.simulation.duration_secs = 3.5;
        config.logging.json = true;
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}

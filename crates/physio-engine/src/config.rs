//! Analysis engine configuration.

use physio_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Environment prefix for overrides, e.g. `PHYSIO_MIN_FRAME_INTERVAL_MS=50`
pub const ENV_PREFIX: &str = "PHYSIO";

/// Session-level tuning shared by every exercise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum spacing between analyzed frames (milliseconds)
    pub min_frame_interval_ms: u64,

    /// Trailing metrics snapshots retained
    pub metrics_history_cap: usize,

    /// Trailing phase changes retained
    pub phase_history_cap: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_frame_interval_ms: 100,
            metrics_history_cap: 10,
            phase_history_cap: 20,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file, with environment overrides
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Self::finish(settings)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Self::finish(settings)
    }

    fn finish(settings: config::Config) -> Result<Self> {
        let config: Self = settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject caps that would make the histories useless
    pub fn validate(&self) -> Result<()> {
        if self.metrics_history_cap == 0 {
            return Err(Error::Config("metrics_history_cap must be at least 1".into()));
        }
        if self.phase_history_cap == 0 {
            return Err(Error::Config("phase_history_cap must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.min_frame_interval_ms, 100);
        assert_eq!(config.metrics_history_cap, 10);
        assert_eq!(config.phase_history_cap, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial_override() {
        let path = std::env::temp_dir().join(format!("physio-engine-{}.toml", std::process::id()));
        std::fs::write(&path, "min_frame_interval_ms = 50\n").unwrap();

        let config = EngineConfig::from_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.min_frame_interval_ms, 50);
        assert_eq!(config.phase_history_cap, 20);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = EngineConfig::from_file("/nonexistent/physio-engine.toml");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_caps() {
        let config = EngineConfig {
            phase_history_cap: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}

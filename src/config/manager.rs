use super::{evolution::EvolutionConfig, schedule::ScheduleConfig, traits::ConfigSection};
use crate::error::GaError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `TRADEEVOLVE_SCHEDULE__MIN_BARS=50`
pub const ENV_PREFIX: &str = "TRADEEVOLVE";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub schedule: ScheduleConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), GaError> {
        self.evolution.validate()?;
        self.schedule.validate()?;
        Ok(())
    }

    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, GaError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(true),
            );
        }
        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        log::debug!(
            "Loaded configuration sections [{}], [{}]",
            EvolutionConfig::section_name(),
            ScheduleConfig::section_name()
        );
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, GaError> {
        let config: AppConfig = toml::from_str(contents)
            .map_err(|e| GaError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), GaError> {
        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| GaError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| GaError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [schedule]
            generation_interval_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.schedule.generation_interval_ms, 50);
        assert_eq!(config.schedule.min_bars, 100);
        assert_eq!(config.evolution, EvolutionConfig::default());
    }

    #[test]
    fn test_invalid_section_is_rejected() {
        let result = AppConfig::from_toml_str(
            r#"
            [evolution]
            population_size = 1
            "#,
        );
        assert!(matches!(result, Err(GaError::Configuration(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!(
            "tradeevolve-config-{}.toml",
            std::process::id()
        ));
        let mut config = AppConfig::default();
        config.evolution.seed = Some(7);
        config.schedule.reseed_pause_ms = 25;

        config.save_to_file(&path).unwrap();
        let loaded = AppConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.evolution.seed, Some(7));
        assert_eq!(loaded.schedule.reseed_pause_ms, 25);
    }
}

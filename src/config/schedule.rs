use super::traits::ConfigSection;
use crate::error::GaError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing of the background evolution loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Bars required before a generation is attempted
    pub min_bars: usize,
    pub insufficient_data_backoff_ms: u64,
    pub reseed_pause_ms: u64,
    pub generation_interval_ms: u64,
    pub stop_timeout_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            min_bars: 100,
            insufficient_data_backoff_ms: 10_000,
            reseed_pause_ms: 5_000,
            generation_interval_ms: 120_000,
            stop_timeout_ms: 5_000,
        }
    }
}

impl ScheduleConfig {
    pub fn insufficient_data_backoff(&self) -> Duration {
        Duration::from_millis(self.insufficient_data_backoff_ms)
    }

    pub fn reseed_pause(&self) -> Duration {
        Duration::from_millis(self.reseed_pause_ms)
    }

    pub fn generation_interval(&self) -> Duration {
        Duration::from_millis(self.generation_interval_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

impl ConfigSection for ScheduleConfig {
    fn section_name() -> &'static str {
        "schedule"
    }

    fn validate(&self) -> Result<(), GaError> {
        if self.min_bars == 0 {
            return Err(GaError::Configuration(
                "Minimum bar count must be at least 1".to_string()
            ));
        }
        Ok(())
    }
}

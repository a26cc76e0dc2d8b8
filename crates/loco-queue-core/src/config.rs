//! Scheduler configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Tunables for [`crate::engine::WaypointScheduler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between ticks when driven through `update`.
    pub tick_interval_secs: f64,
    /// |velocity| at or below this counts as stopped.
    pub stopped_speed_threshold: f32,
    /// Orders one locomotive may resolve inside a single tick.
    pub max_orders_per_tick: usize,
    /// Length of an in-sim day, for time-of-day waits.
    pub seconds_per_day: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 0.5,
            stopped_speed_threshold: 0.01,
            max_orders_per_tick: 8,
            seconds_per_day: 86_400.0,
        }
    }
}

impl SchedulerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, crate::persistence::LoadError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&text)?)
    }

    /// Validate the configuration, returning all errors found.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if !(self.tick_interval_secs.is_finite() && self.tick_interval_secs > 0.0) {
            errors.push(ConfigError::InvalidTickInterval(self.tick_interval_secs));
        }
        if !(self.stopped_speed_threshold >= 0.0) {
            errors.push(ConfigError::NegativeSpeedThreshold(self.stopped_speed_threshold));
        }
        if self.max_orders_per_tick == 0 {
            errors.push(ConfigError::ZeroOrdersPerTick);
        }
        if !(self.seconds_per_day.is_finite() && self.seconds_per_day > 0.0) {
            errors.push(ConfigError::InvalidDayLength(self.seconds_per_day));
        }
        errors
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("tick interval must be positive (got {0})")]
    InvalidTickInterval(f64),
    #[error("stopped speed threshold must not be negative (got {0})")]
    NegativeSpeedThreshold(f32),
    #[error("max orders per tick must be at least 1")]
    ZeroOrdersPerTick,
    #[error("day length must be positive (got {0})")]
    InvalidDayLength(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SchedulerConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.tick_interval_secs, 0.5);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SchedulerConfig::from_json(r#"{"max_orders_per_tick": 2}"#).unwrap();
        assert_eq!(config.max_orders_per_tick, 2);
        assert_eq!(config.seconds_per_day, 86_400.0);
    }

    #[test]
    fn test_validate_collects_all() {
        let config = SchedulerConfig {
            tick_interval_secs: 0.0,
            stopped_speed_threshold: -1.0,
            max_orders_per_tick: 0,
            seconds_per_day: f64::NAN,
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ConfigError::ZeroOrdersPerTick));
    }
}

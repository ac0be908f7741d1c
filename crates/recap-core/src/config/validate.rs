//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::{Config, DelayRange};

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let settings = &self.enhancement_settings;
        let delay = settings.processing_delay;

        if !delay.min.is_finite() || !delay.max.is_finite() {
            return Err(ConfigError::ValidationError(
                "processing_delay bounds must be finite".into(),
            ));
        }
        if delay.min < 0.0 || delay.max < 0.0 {
            return Err(ConfigError::ValidationError(
                "processing_delay bounds must be >= 0".into(),
            ));
        }
        if delay.max > DelayRange::MAX_SECS {
            return Err(ConfigError::ValidationError(format!(
                "processing_delay.max ({}) must be <= {} seconds",
                delay.max,
                DelayRange::MAX_SECS
            )));
        }
        if delay.min > delay.max {
            return Err(ConfigError::ValidationError(format!(
                "processing_delay.min ({}) must be <= processing_delay.max ({})",
                delay.min, delay.max
            )));
        }
        if settings.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "enhancement_settings.timeout_ms must be > 0".into(),
            ));
        }
        if settings.parallel == 0 {
            return Err(ConfigError::ValidationError(
                "enhancement_settings.parallel must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&settings.min_word_overlap) {
            return Err(ConfigError::ValidationError(
                "enhancement_settings.min_word_overlap must be between 0.0 and 1.0".into(),
            ));
        }
        if self.service.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "service.endpoint must not be empty".into(),
            ));
        }
        if self.service.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "service.model must not be empty".into(),
            ));
        }
        Ok(())
    }
}

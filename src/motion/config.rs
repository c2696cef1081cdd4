//! Tunable policy constants for motion classification

use serde::{Deserialize, Serialize};

/// Configuration for the sampler, classifier and state tracker
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Minimum spacing between processed samples, in milliseconds
    pub sample_interval_ms: u64,

    /// L1 delta above which a sample counts as movement
    pub delta_threshold: f64,

    /// The confirmation counter must exceed this before `Moving` is declared
    pub consecutive_samples_to_confirm: u32,

    /// Consecutive quiet samples (with a drained counter) before `Still` is declared
    pub still_samples_to_confirm: u32,

    /// Samples whose every axis magnitude is below this are skipped as noise
    pub noise_floor: Option<f64>,

    /// Minimum time between two state flips, in milliseconds
    pub transition_debounce_ms: Option<u64>,

    /// Refresh the last transition time on every `Moving` verdict
    pub refresh_on_moving: bool,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 300,
            delta_threshold: 3.0,
            consecutive_samples_to_confirm: 2,
            still_samples_to_confirm: 2,
            noise_floor: None,
            transition_debounce_ms: None,
            refresh_on_moving: true,
        }
    }
}

impl MotionConfig {
    /// Earlier tuning: higher threshold and near-zero noise rejection
    pub fn legacy() -> Self {
        Self {
            delta_threshold: 5.0,
            noise_floor: Some(1.0),
            ..Default::default()
        }
    }

    /// Set the movement threshold
    pub fn with_threshold(mut self, delta_threshold: f64) -> Self {
        self.delta_threshold = delta_threshold;
        self
    }

    /// Set the minimum inter-sample interval
    pub fn with_sample_interval(mut self, sample_interval_ms: u64) -> Self {
        self.sample_interval_ms = sample_interval_ms;
        self
    }

    /// Set how many exceedances confirm movement
    pub fn with_confirmation(mut self, samples: u32) -> Self {
        self.consecutive_samples_to_confirm = samples;
        self
    }

    /// Set how many quiet samples confirm stillness
    pub fn with_still_confirmation(mut self, samples: u32) -> Self {
        self.still_samples_to_confirm = samples;
        self
    }

    /// Enable near-zero noise rejection
    pub fn with_noise_floor(mut self, floor: f64) -> Self {
        self.noise_floor = Some(floor);
        self
    }

    /// Enable the state-transition debounce
    pub fn with_transition_debounce(mut self, debounce_ms: u64) -> Self {
        self.transition_debounce_ms = Some(debounce_ms);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.delta_threshold.is_finite() || self.delta_threshold < 0.0 {
            return Err(format!(
                "delta_threshold must be a non-negative number, got {}",
                self.delta_threshold
            ));
        }

        if self.still_samples_to_confirm == 0 {
            return Err("still_samples_to_confirm must be at least 1".to_string());
        }

        if let Some(floor) = self.noise_floor {
            if !floor.is_finite() || floor < 0.0 {
                return Err(format!("noise_floor must be non-negative, got {}", floor));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MotionConfig::default();
        assert_eq!(config.sample_interval_ms, 300);
        assert_eq!(config.delta_threshold, 3.0);
        assert!(config.refresh_on_moving);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = MotionConfig::default()
            .with_threshold(4.5)
            .with_confirmation(3)
            .with_transition_debounce(1000);

        assert_eq!(config.delta_threshold, 4.5);
        assert_eq!(config.consecutive_samples_to_confirm, 3);
        assert_eq!(config.transition_debounce_ms, Some(1000));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let config = MotionConfig::default().with_threshold(f64::NAN);
        assert!(config.validate().is_err());

        let config = MotionConfig::default().with_still_confirmation(0);
        assert!(config.validate().is_err());
    }
}

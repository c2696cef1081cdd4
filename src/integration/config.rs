//! Configuration for the integration layer
//!
//! Gathers every component's settings and loads them from TOML.

use crate::coach::config::{DispatchConfig, GatewayConfig};
use crate::motion::config::MotionConfig;
use crate::speech::voice::SpeechConfig;
use crate::{CoachError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the complete coaching loop
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Sampling and classification
    pub motion: MotionConfig,

    /// Prompt dispatch policy
    pub dispatch: DispatchConfig,

    /// Chat gateway
    pub gateway: GatewayConfig,

    /// Voice output
    pub speech: SpeechConfig,
}

impl CoachConfig {
    /// Earlier tuning generation
    pub fn legacy() -> Self {
        Self {
            motion: MotionConfig::legacy(),
            dispatch: DispatchConfig::legacy(),
            ..Default::default()
        }
    }

    /// Parse from a TOML document; missing fields take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CoachError::Config(format!("Invalid config: {}", e)))
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoachError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Set the motion configuration
    pub fn with_motion(mut self, motion: MotionConfig) -> Self {
        self.motion = motion;
        self
    }

    /// Set the dispatch configuration
    pub fn with_dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Set the gateway configuration
    pub fn with_gateway(mut self, gateway: GatewayConfig) -> Self {
        self.gateway = gateway;
        self
    }

    /// Set the speech configuration
    pub fn with_speech(mut self, speech: SpeechConfig) -> Self {
        self.speech = speech;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.motion.validate().map_err(CoachError::Config)?;
        self.dispatch.validate().map_err(CoachError::Config)?;
        self.gateway.validate().map_err(CoachError::Config)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::config::SustainedPolicy;

    #[test]
    fn test_default_config() {
        let config = CoachConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.speech.enabled);
        assert_eq!(config.dispatch.periodic_check_ms, 10_000);
    }

    #[test]
    fn test_partial_toml() {
        let config = CoachConfig::from_toml_str(
            r#"
            [motion]
            delta_threshold = 4.0
            noise_floor = 1.0

            [dispatch]
            sustained_policy = "elapsed_only"
            message_debounce_ms = 5000

            [speech]
            enabled = true
            command = "espeak"
            "#,
        )
        .unwrap();

        assert_eq!(config.motion.delta_threshold, 4.0);
        assert_eq!(config.motion.noise_floor, Some(1.0));
        assert_eq!(config.motion.sample_interval_ms, 300);
        assert_eq!(config.dispatch.sustained_policy, SustainedPolicy::ElapsedOnly);
        assert_eq!(config.dispatch.message_debounce_ms, Some(5000));
        assert!(config.speech.enabled);
        assert_eq!(config.gateway, GatewayConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            CoachConfig::from_toml_str("[motion]\ndelta_threshold = \"high\""),
            Err(CoachError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("motion-coach-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[dispatch]\nperiodic_check_ms = 2500\n").unwrap();

        let config = CoachConfig::load(&path).unwrap();
        assert_eq!(config.dispatch.periodic_check_ms, 2500);

        std::fs::remove_file(&path).unwrap();
        assert!(CoachConfig::load(&path).is_err());
    }

    #[test]
    fn test_validation_rejects_zero_period() {
        let config = CoachConfig::default()
            .with_dispatch(DispatchConfig::default().with_periodic_check(0));
        assert!(config.validate().is_err());
    }
}

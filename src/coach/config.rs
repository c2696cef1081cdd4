//! Dispatch policy and chat gateway configuration

use serde::{Deserialize, Serialize};

/// Default chat-completions endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.fireworks.ai/inference/v1/chat/completions";

/// Default hosted model
pub const DEFAULT_MODEL: &str = "accounts/sentientfoundation/models/dobby-mini-unhinged-llama-3-1-8b#accounts/sentientfoundation/deployments/81e155fc";

/// Environment variable holding the bearer token
pub const DEFAULT_API_KEY_ENV: &str = "FIREWORKS_API_KEY";

/// Reply used when the model returns no content
pub const FALLBACK_REPLY: &str = "No response from AI";

/// How the periodic check picks a sustained-state prompt
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SustainedPolicy {
    /// Moving within the window -> sustained_moving; still beyond it -> sustained_still
    #[default]
    StateGated,
    /// Within the window -> sustained_moving, otherwise sustained_still, whatever the state
    ElapsedOnly,
}

/// Configuration for the messaging dispatcher
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Period of the sustained-state check
    pub periodic_check_ms: u64,

    /// Window separating "still in this state" from "long enough to escalate"
    pub sustained_window_ms: u64,

    /// Periodic prompt selection policy
    pub sustained_policy: SustainedPolicy,

    /// Minimum spacing between motion-derived messages
    pub message_debounce_ms: Option<u64>,

    /// Whether transitions dispatch prompts at all
    pub dispatch_on_transition: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            periodic_check_ms: 10_000,
            sustained_window_ms: 10_000,
            sustained_policy: SustainedPolicy::StateGated,
            message_debounce_ms: None,
            dispatch_on_transition: true,
        }
    }
}

impl DispatchConfig {
    /// Earlier generation: message-level debounce, elapsed-only periodic policy
    pub fn legacy() -> Self {
        Self {
            sustained_policy: SustainedPolicy::ElapsedOnly,
            message_debounce_ms: Some(5_000),
            ..Default::default()
        }
    }

    /// Set the periodic check interval
    pub fn with_periodic_check(mut self, periodic_check_ms: u64) -> Self {
        self.periodic_check_ms = periodic_check_ms;
        self
    }

    /// Set the sustained window
    pub fn with_sustained_window(mut self, sustained_window_ms: u64) -> Self {
        self.sustained_window_ms = sustained_window_ms;
        self
    }

    /// Set the periodic policy
    pub fn with_policy(mut self, policy: SustainedPolicy) -> Self {
        self.sustained_policy = policy;
        self
    }

    /// Enable the message-level debounce
    pub fn with_message_debounce(mut self, debounce_ms: u64) -> Self {
        self.message_debounce_ms = Some(debounce_ms);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.periodic_check_ms == 0 {
            return Err("periodic_check_ms must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Configuration for the HTTP chat gateway
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Chat-completions URL
    pub endpoint: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Name of the environment variable carrying the API key
    pub api_key_env: String,

    /// Request timeout
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Set the endpoint URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(format!("Gateway endpoint is not an HTTP URL: {}", self.endpoint));
        }
        if self.model.trim().is_empty() {
            return Err("Gateway model is required".to_string());
        }
        Ok(())
    }
}

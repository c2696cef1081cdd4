//! Chat gateway: request/reply access to a hosted chat model

use crate::coach::config::{GatewayConfig, FALLBACK_REPLY};
use crate::{CoachError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A single message for the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    /// Build a request; the message must not be blank
    pub fn new(message: impl Into<String>) -> Result<Self> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(CoachError::InvalidRequest(
                "Message cannot be empty".to_string(),
            ));
        }
        Ok(Self { message })
    }
}

/// The model's reply text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Request/reply RPC to a remote chat model.
///
/// Every failure surfaces as [`CoachError::Gateway`] with no finer subtype.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn send(&self, request: ChatRequest) -> Result<ChatReply>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<CompletionContent>,
}

#[derive(Debug, Deserialize)]
struct CompletionContent {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionResponse {
    fn into_reply(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_else(|| FALLBACK_REPLY.to_string())
    }
}

/// Bearer-authenticated HTTPS chat-completions client
pub struct HttpChatGateway {
    client: reqwest::Client,
    config: GatewayConfig,
    api_key: String,
}

impl HttpChatGateway {
    /// Create a gateway with an explicit API key
    pub fn new(config: GatewayConfig, api_key: impl Into<String>) -> Result<Self> {
        config.validate().map_err(CoachError::Config)?;

        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CoachError::Config("API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CoachError::Config(format!("Failed to build HTTP client: {}", e)))?;

        info!("Chat gateway ready: {} ({})", config.endpoint, config.model);

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Create a gateway reading the API key from the configured environment variable
    pub fn from_env(config: GatewayConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            CoachError::Config(format!("{} is not set", config.api_key_env))
        })?;
        Self::new(config, api_key)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[async_trait]
impl ChatGateway for HttpChatGateway {
    async fn send(&self, request: ChatRequest) -> Result<ChatReply> {
        let body = CompletionRequest {
            model: &self.config.model,
            messages: vec![CompletionMessage {
                role: "user",
                content: &request.message,
            }],
        };

        let start = Instant::now();
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Chat request failed: {}", e);
                CoachError::Gateway("Failed to communicate with AI service".to_string())
            })?;

        if !response.status().is_success() {
            warn!("Chat endpoint returned {}", response.status());
            return Err(CoachError::Gateway(
                "Failed to get response from AI".to_string(),
            ));
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            warn!("Malformed chat response: {}", e);
            CoachError::Gateway("Failed to communicate with AI service".to_string())
        })?;

        let reply = parsed.into_reply();
        debug!(
            "Chat reply: {} chars in {}ms",
            reply.len(),
            start.elapsed().as_millis()
        );

        Ok(ChatReply { reply })
    }
}

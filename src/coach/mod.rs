//! Motion coaching: prompt selection and the chat gateway
//!
//! - **config**: Dispatch policy and gateway settings
//! - **dispatcher**: Picks a prompt for each transition or periodic tick
//! - **gateway**: Request/reply access to the hosted chat model
//! - **prompts**: Canned coaching prompts per trigger kind

pub mod config;
pub mod dispatcher;
pub mod gateway;
pub mod prompts;

pub use config::{DispatchConfig, GatewayConfig, SustainedPolicy};
pub use dispatcher::{DispatchInput, Dispatcher};
pub use gateway::{ChatGateway, ChatReply, ChatRequest, HttpChatGateway};
pub use prompts::{prompt_for, CoachingPrompt, PromptKind};

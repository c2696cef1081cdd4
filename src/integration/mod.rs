//! End-to-end integration module
//!
//! This module provides the orchestration layer that connects all components
//! of the coach: Sensor -> Classifier -> Dispatcher -> Chat Gateway -> Voice

mod config;
mod orchestrator;

pub use config::CoachConfig;
pub use orchestrator::{
    Orchestrator, OrchestratorBuilder, OrchestratorCommand, OrchestratorEvent,
    OrchestratorHandle,
};

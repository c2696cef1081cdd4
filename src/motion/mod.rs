//! Motion sensing: sampling, classification and movement state
//!
//! - **config**: Thresholds and debounce windows
//! - **sampler**: Raw sensor events to acceleration samples
//! - **classifier**: Delta thresholding with a confirmation counter
//! - **state**: The authoritative `Still`/`Moving` state and transitions
//! - **source**: Cancellable sensor subscriptions and the permission gate

pub mod classifier;
pub mod config;
pub mod sampler;
pub mod source;
pub mod state;

pub use classifier::{Classification, MovementClassifier, SkipReason, Verdict};
pub use config::MotionConfig;
pub use sampler::{AccelerationSample, AxisReading, MotionSampler, SensorEvent};
pub use source::{
    MotionPermission, NoPermissionGate, PermissionState, SensorCallback, SensorHub, SensorSource,
    StaticPermission, Subscription,
};
pub use state::{MovementState, StateTracker, TransitionEvent};

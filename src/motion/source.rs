//! Sensor subscription and the motion permission gate
//!
//! Sources hand out a [`Subscription`] per listener. Dropping or explicitly
//! unsubscribing it deregisters the callback, so teardown never leaks a
//! listener.

use crate::motion::sampler::SensorEvent;
use crate::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Callback invoked for every sensor event
pub type SensorCallback = Arc<dyn Fn(SensorEvent) + Send + Sync>;

/// A source of raw motion events
pub trait SensorSource: Send + Sync {
    /// Register a listener; it stays registered until the subscription ends
    fn subscribe(&self, callback: SensorCallback) -> Subscription;
}

/// Handle to a registered listener
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Deregister the listener
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Default)]
struct HubListeners {
    next_id: u64,
    listeners: Vec<(u64, SensorCallback)>,
}

/// In-process fan-out source; whoever owns the sensor calls [`SensorHub::emit`]
#[derive(Clone, Default)]
pub struct SensorHub {
    inner: Arc<Mutex<HubListeners>>,
}

impl SensorHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every listener, returning how many received it
    pub fn emit(&self, event: SensorEvent) -> usize {
        let listeners: Vec<SensorCallback> = self
            .inner
            .lock()
            .listeners
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for listener in &listeners {
            listener(event);
        }

        listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

impl SensorSource for SensorHub {
    fn subscribe(&self, callback: SensorCallback) -> Subscription {
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push((id, callback));
            id
        };
        debug!("Sensor listener {} registered", id);

        let weak: Weak<Mutex<HubListeners>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().listeners.retain(|(existing, _)| *existing != id);
                debug!("Sensor listener {} removed", id);
            }
        })
    }
}

/// Result of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
}

/// Platform consent gate for motion sensing
#[async_trait]
pub trait MotionPermission: Send + Sync {
    /// Whether sensing must wait for an explicit grant
    fn requires_permission(&self) -> bool;

    /// Ask the user for permission
    async fn request(&self) -> Result<PermissionState>;
}

/// Platforms without a consent prompt: sensing starts immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPermissionGate;

#[async_trait]
impl MotionPermission for NoPermissionGate {
    fn requires_permission(&self) -> bool {
        false
    }

    async fn request(&self) -> Result<PermissionState> {
        Ok(PermissionState::Granted)
    }
}

/// Gate that requires an explicit request and answers with a fixed state
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission {
    answer: PermissionState,
}

impl StaticPermission {
    pub fn granting() -> Self {
        Self {
            answer: PermissionState::Granted,
        }
    }

    pub fn denying() -> Self {
        Self {
            answer: PermissionState::Denied,
        }
    }
}

#[async_trait]
impl MotionPermission for StaticPermission {
    fn requires_permission(&self) -> bool {
        true
    }

    async fn request(&self) -> Result<PermissionState> {
        Ok(self.answer)
    }
}

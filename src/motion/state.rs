//! Authoritative movement state and transition policy

use crate::motion::classifier::Verdict;
use crate::motion::config::MotionConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Movement state of the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementState {
    #[default]
    Still,
    Moving,
}

impl MovementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementState::Still => "still",
            MovementState::Moving => "moving",
        }
    }
}

impl From<Verdict> for MovementState {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Moving => MovementState::Moving,
            Verdict::Still => MovementState::Still,
        }
    }
}

/// A change of movement state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub from: MovementState,
    pub to: MovementState,
    pub at_ms: u64,
}

impl TransitionEvent {
    pub fn is_start(&self) -> bool {
        self.from == MovementState::Still && self.to == MovementState::Moving
    }

    pub fn is_stop(&self) -> bool {
        self.from == MovementState::Moving && self.to == MovementState::Still
    }
}

/// Holds the single authoritative movement state
#[derive(Debug, Clone)]
pub struct StateTracker {
    state: MovementState,
    last_transition_ms: u64,
    last_flip_ms: Option<u64>,
    refresh_on_moving: bool,
    transition_debounce_ms: Option<u64>,
}

impl StateTracker {
    /// Start `Still` at the given session time
    pub fn new(config: &MotionConfig, started_ms: u64) -> Self {
        Self {
            state: MovementState::Still,
            last_transition_ms: started_ms,
            last_flip_ms: None,
            refresh_on_moving: config.refresh_on_moving,
            transition_debounce_ms: config.transition_debounce_ms,
        }
    }

    /// Apply a verdict, returning the transition it caused, if any
    pub fn apply(&mut self, verdict: Verdict, at_ms: u64) -> Option<TransitionEvent> {
        let next = MovementState::from(verdict);

        if next == self.state {
            if self.state == MovementState::Moving
                && self.refresh_on_moving
                && at_ms > self.last_transition_ms
            {
                self.last_transition_ms = at_ms;
            }
            return None;
        }

        if at_ms < self.last_transition_ms {
            debug!(
                "Ignoring stale verdict at {}ms (last transition {}ms)",
                at_ms, self.last_transition_ms
            );
            return None;
        }

        if let (Some(debounce), Some(last_flip)) = (self.transition_debounce_ms, self.last_flip_ms) {
            if at_ms.saturating_sub(last_flip) < debounce {
                debug!(
                    "Suppressing {} -> {} within {}ms debounce",
                    self.state.as_str(),
                    next.as_str(),
                    debounce
                );
                return None;
            }
        }

        let event = TransitionEvent {
            from: self.state,
            to: next,
            at_ms,
        };

        self.state = next;
        self.last_transition_ms = at_ms;
        self.last_flip_ms = Some(at_ms);

        Some(event)
    }

    pub fn state(&self) -> MovementState {
        self.state
    }

    pub fn is_moving(&self) -> bool {
        self.state == MovementState::Moving
    }

    pub fn last_transition_ms(&self) -> u64 {
        self.last_transition_ms
    }

    /// Time since the last transition (or refresh)
    pub fn elapsed_since_transition(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_transition_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> StateTracker {
        StateTracker::new(&MotionConfig::default(), 0)
    }

    #[test]
    fn test_starts_still() {
        let t = tracker();
        assert_eq!(t.state(), MovementState::Still);
        assert_eq!(t.last_transition_ms(), 0);
    }

    #[test]
    fn test_flip_emits_transition() {
        let mut t = tracker();
        let event = t.apply(Verdict::Moving, 1200).unwrap();
        assert!(event.is_start());
        assert_eq!(event.at_ms, 1200);
        assert_eq!(t.state(), MovementState::Moving);

        let event = t.apply(Verdict::Still, 5000).unwrap();
        assert!(event.is_stop());
        assert_eq!(t.last_transition_ms(), 5000);
    }

    #[test]
    fn test_matching_still_verdict_is_silent() {
        let mut t = tracker();
        assert!(t.apply(Verdict::Still, 3000).is_none());
        assert_eq!(t.last_transition_ms(), 0);
    }

    #[test]
    fn test_moving_verdict_refreshes() {
        let mut t = tracker();
        t.apply(Verdict::Moving, 1000);
        assert!(t.apply(Verdict::Moving, 4000).is_none());
        assert_eq!(t.last_transition_ms(), 4000);
        assert_eq!(t.elapsed_since_transition(6000), 2000);
    }

    #[test]
    fn test_refresh_can_be_disabled() {
        let config = MotionConfig {
            refresh_on_moving: false,
            ..Default::default()
        };
        let mut t = StateTracker::new(&config, 0);
        t.apply(Verdict::Moving, 1000);
        t.apply(Verdict::Moving, 4000);
        assert_eq!(t.last_transition_ms(), 1000);
    }

    #[test]
    fn test_transition_debounce() {
        let config = MotionConfig::default().with_transition_debounce(2000);
        let mut t = StateTracker::new(&config, 0);

        assert!(t.apply(Verdict::Moving, 500).is_some());
        assert!(t.apply(Verdict::Still, 1500).is_none());
        assert_eq!(t.state(), MovementState::Moving);
        assert!(t.apply(Verdict::Still, 2600).is_some());
    }
}

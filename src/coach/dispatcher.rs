//! Coaching prompt selection
//!
//! Transitions and periodic ticks both arrive as a [`DispatchInput`] and go
//! through the same selection and rate-limiting path.

use crate::coach::config::{DispatchConfig, SustainedPolicy};
use crate::coach::prompts::{prompt_for, CoachingPrompt, PromptKind};
use crate::motion::state::{MovementState, StateTracker, TransitionEvent};
use tracing::debug;

/// Something that may warrant a coaching message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchInput {
    /// Movement state changed
    Transition(TransitionEvent),
    /// Periodic sustained-state check
    Tick { now_ms: u64 },
}

impl DispatchInput {
    fn at_ms(&self) -> u64 {
        match self {
            DispatchInput::Transition(event) => event.at_ms,
            DispatchInput::Tick { now_ms } => *now_ms,
        }
    }
}

/// Decides which prompt, if any, to send
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: DispatchConfig,
    last_dispatch_ms: Option<u64>,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            last_dispatch_ms: None,
        }
    }

    /// Select the prompt for an input, applying the message debounce
    pub fn dispatch(
        &mut self,
        input: DispatchInput,
        tracker: &StateTracker,
    ) -> Option<CoachingPrompt> {
        let kind = self.select(input, tracker)?;
        let at_ms = input.at_ms();

        if let (Some(debounce), Some(last)) = (self.config.message_debounce_ms, self.last_dispatch_ms)
        {
            if at_ms.saturating_sub(last) < debounce {
                debug!(
                    "Debounced {} ({}ms since last message)",
                    kind.as_str(),
                    at_ms.saturating_sub(last)
                );
                return None;
            }
        }

        self.last_dispatch_ms = Some(at_ms);
        Some(prompt_for(kind))
    }

    /// Prompt selection without side effects
    pub fn select(&self, input: DispatchInput, tracker: &StateTracker) -> Option<PromptKind> {
        match input {
            DispatchInput::Transition(event) => {
                if !self.config.dispatch_on_transition {
                    return None;
                }
                match (event.from, event.to) {
                    (MovementState::Still, MovementState::Moving) => {
                        Some(PromptKind::StartedMoving)
                    }
                    (MovementState::Moving, MovementState::Still) => {
                        Some(PromptKind::StoppedMoving)
                    }
                    _ => None,
                }
            }
            DispatchInput::Tick { now_ms } => {
                let elapsed = tracker.elapsed_since_transition(now_ms);
                let within_window = elapsed <= self.config.sustained_window_ms;

                match self.config.sustained_policy {
                    SustainedPolicy::StateGated => match tracker.state() {
                        MovementState::Moving if within_window => Some(PromptKind::SustainedMoving),
                        MovementState::Still if !within_window => Some(PromptKind::SustainedStill),
                        _ => None,
                    },
                    SustainedPolicy::ElapsedOnly => {
                        if within_window {
                            Some(PromptKind::SustainedMoving)
                        } else {
                            Some(PromptKind::SustainedStill)
                        }
                    }
                }
            }
        }
    }

    /// Session time of the last motion-derived message
    pub fn last_dispatch_ms(&self) -> Option<u64> {
        self.last_dispatch_ms
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{MotionConfig, Verdict};

    fn still_tracker() -> StateTracker {
        StateTracker::new(&MotionConfig::default(), 0)
    }

    fn moving_tracker(at_ms: u64) -> StateTracker {
        let mut tracker = still_tracker();
        tracker.apply(Verdict::Moving, at_ms);
        tracker
    }

    #[test]
    fn test_transitions_select_matching_prompt() {
        let mut dispatcher = Dispatcher::new(DispatchConfig::default());
        let mut tracker = still_tracker();

        let start = tracker.apply(Verdict::Moving, 1000).unwrap();
        let prompt = dispatcher
            .dispatch(DispatchInput::Transition(start), &tracker)
            .unwrap();
        assert_eq!(prompt.kind, PromptKind::StartedMoving);

        let stop = tracker.apply(Verdict::Still, 4000).unwrap();
        let prompt = dispatcher
            .dispatch(DispatchInput::Transition(stop), &tracker)
            .unwrap();
        assert_eq!(prompt.kind, PromptKind::StoppedMoving);
    }

    #[test]
    fn test_state_gated_ticks() {
        let dispatcher = Dispatcher::new(DispatchConfig::default());

        // Still for 11s
        let tracker = still_tracker();
        assert_eq!(
            dispatcher.select(DispatchInput::Tick { now_ms: 11_000 }, &tracker),
            Some(PromptKind::SustainedStill)
        );
        assert_eq!(
            dispatcher.select(DispatchInput::Tick { now_ms: 5_000 }, &tracker),
            None
        );

        // Moving for 5s
        let tracker = moving_tracker(10_000);
        assert_eq!(
            dispatcher.select(DispatchInput::Tick { now_ms: 15_000 }, &tracker),
            Some(PromptKind::SustainedMoving)
        );
        assert_eq!(
            dispatcher.select(DispatchInput::Tick { now_ms: 21_000 }, &tracker),
            None
        );
    }

    #[test]
    fn test_elapsed_only_ticks_ignore_state() {
        let dispatcher = Dispatcher::new(DispatchConfig::default().with_policy(SustainedPolicy::ElapsedOnly));

        let tracker = still_tracker();
        assert_eq!(
            dispatcher.select(DispatchInput::Tick { now_ms: 5_000 }, &tracker),
            Some(PromptKind::SustainedMoving)
        );

        let tracker = moving_tracker(1_000);
        assert_eq!(
            dispatcher.select(DispatchInput::Tick { now_ms: 20_000 }, &tracker),
            Some(PromptKind::SustainedStill)
        );
    }

    #[test]
    fn test_message_debounce() {
        let mut dispatcher = Dispatcher::new(DispatchConfig::default().with_message_debounce(5_000));
        let mut tracker = still_tracker();

        let start = tracker.apply(Verdict::Moving, 1_000).unwrap();
        assert!(dispatcher
            .dispatch(DispatchInput::Transition(start), &tracker)
            .is_some());

        let stop = tracker.apply(Verdict::Still, 3_000).unwrap();
        assert!(dispatcher
            .dispatch(DispatchInput::Transition(stop), &tracker)
            .is_none());
        assert_eq!(dispatcher.last_dispatch_ms(), Some(1_000));

        assert_eq!(
            dispatcher
                .dispatch(DispatchInput::Tick { now_ms: 14_000 }, &tracker)
                .map(|p| p.kind),
            Some(PromptKind::SustainedStill)
        );
    }

    #[test]
    fn test_no_debounce_by_default() {
        let mut dispatcher = Dispatcher::new(DispatchConfig::default());
        let mut tracker = still_tracker();

        let start = tracker.apply(Verdict::Moving, 1_000).unwrap();
        let stop = tracker.apply(Verdict::Still, 1_300).unwrap();
        assert!(dispatcher.dispatch(DispatchInput::Transition(start), &tracker).is_some());
        assert!(dispatcher.dispatch(DispatchInput::Transition(stop), &tracker).is_some());
    }

    #[test]
    fn test_transition_dispatch_can_be_disabled() {
        let config = DispatchConfig {
            dispatch_on_transition: false,
            ..Default::default()
        };
        let mut dispatcher = Dispatcher::new(config);
        let mut tracker = still_tracker();
        let start = tracker.apply(Verdict::Moving, 1_000).unwrap();
        assert!(dispatcher.dispatch(DispatchInput::Transition(start), &tracker).is_none());
    }
}

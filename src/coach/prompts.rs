//! Canned coaching prompts, one per trigger kind

use serde::{Deserialize, Serialize};

/// What caused a coaching message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// Still -> Moving transition
    StartedMoving,
    /// Moving -> Still transition
    StoppedMoving,
    /// Periodic check while movement continues
    SustainedMoving,
    /// Periodic check after a long still period
    SustainedStill,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::StartedMoving => "started_moving",
            PromptKind::StoppedMoving => "stopped_moving",
            PromptKind::SustainedMoving => "sustained_moving",
            PromptKind::SustainedStill => "sustained_still",
        }
    }

    /// Whether the prompt came from a transition rather than the timer
    pub fn is_transition(&self) -> bool {
        matches!(self, PromptKind::StartedMoving | PromptKind::StoppedMoving)
    }
}

/// An immutable prompt template tagged by trigger kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoachingPrompt {
    pub kind: PromptKind,
    pub text: &'static str,
}

pub const STARTED_MOVING: CoachingPrompt = CoachingPrompt {
    kind: PromptKind::StartedMoving,
    text: "I just started moving! Give me one short, energetic line to keep me going.",
};

pub const STOPPED_MOVING: CoachingPrompt = CoachingPrompt {
    kind: PromptKind::StoppedMoving,
    text: "I just stopped moving. Give me one short, motivating nudge to get going again.",
};

pub const SUSTAINED_MOVING: CoachingPrompt = CoachingPrompt {
    kind: PromptKind::SustainedMoving,
    text: "I'm still moving and keeping it up. Cheer me on in one or two sentences.",
};

pub const SUSTAINED_STILL: CoachingPrompt = CoachingPrompt {
    kind: PromptKind::SustainedStill,
    text: "I've been sitting still for a while now. Give me a playful push to get up and move.",
};

/// Look up the prompt for a trigger kind
pub fn prompt_for(kind: PromptKind) -> CoachingPrompt {
    match kind {
        PromptKind::StartedMoving => STARTED_MOVING,
        PromptKind::StoppedMoving => STOPPED_MOVING,
        PromptKind::SustainedMoving => SUSTAINED_MOVING,
        PromptKind::SustainedStill => SUSTAINED_STILL,
    }
}

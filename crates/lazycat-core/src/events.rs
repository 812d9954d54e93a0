use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phase::{BasePhase, Phase, TransitionCause};

/// Every state change in the timer produces an Event.
/// The state manager reacts to them; renderers and the CLI print them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    OnboardingCompleted {
        work_minutes: u32,
        rest_minutes: u32,
        at: DateTime<Utc>,
    },
    TimerStarted {
        phase: BasePhase,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        resume_to: BasePhase,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        phase: BasePhase,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: Phase,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    /// The countdown crossed the near-expiry threshold.
    NearExpiry {
        phase: BasePhase,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    /// `Working <-> Resting`, either by expiry or by skip.
    PhaseChanged {
        from: BasePhase,
        to: BasePhase,
        cause: TransitionCause,
        duration_secs: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::OnboardingCompleted { .. } => "onboarding_completed",
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::TimerResumed { .. } => "timer_resumed",
            Event::TimerReset { .. } => "timer_reset",
            Event::NearExpiry { .. } => "near_expiry",
            Event::PhaseChanged { .. } => "phase_changed",
        }
    }
}

//! Phase state machine.
//!
//! A pure description of which phase the timer is in and which transitions
//! are legal. Nothing here reads the clock or touches storage; the timer
//! engine applies these rules to its own state.
//!
//! ## State Transitions
//!
//! ```text
//! Onboarding -> Working <-> Resting
//!               Working|Resting -> Paused(base) -> base
//! ```
//!
//! `Paused` carries a [`BasePhase`] rather than another [`Phase`], so a pause
//! can never wrap a pause and always resumes into `Working` or `Resting`.

use serde::{Deserialize, Serialize};

/// The two phases the cycle alternates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasePhase {
    Working,
    Resting,
}

impl BasePhase {
    /// The phase that follows this one when its countdown expires.
    pub fn next(self) -> Self {
        match self {
            BasePhase::Working => BasePhase::Resting,
            BasePhase::Resting => BasePhase::Working,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BasePhase::Working => "working",
            BasePhase::Resting => "resting",
        }
    }
}

/// The timer's current mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "phase", content = "resume_to", rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Onboarding,
    Working,
    Resting,
    Paused(BasePhase),
}

impl From<BasePhase> for Phase {
    fn from(base: BasePhase) -> Self {
        match base {
            BasePhase::Working => Phase::Working,
            BasePhase::Resting => Phase::Resting,
        }
    }
}

impl Phase {
    /// The phase with any pause unwrapped. `None` during onboarding.
    pub fn base(self) -> Option<BasePhase> {
        match self {
            Phase::Onboarding => None,
            Phase::Working => Some(BasePhase::Working),
            Phase::Resting => Some(BasePhase::Resting),
            Phase::Paused(base) => Some(base),
        }
    }

    pub fn is_paused(self) -> bool {
        matches!(self, Phase::Paused(_))
    }

    /// `Working` or `Resting`, i.e. a phase whose countdown may run.
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Working | Phase::Resting)
    }

    /// `Onboarding -> Working`. Any other phase is left alone.
    pub fn complete_onboarding(self) -> Option<Phase> {
        match self {
            Phase::Onboarding => Some(Phase::Working),
            _ => None,
        }
    }

    /// `Working|Resting -> Paused(current)`. No-op for onboarding and for an
    /// already paused phase.
    pub fn pause(self) -> Option<Phase> {
        match self {
            Phase::Working => Some(Phase::Paused(BasePhase::Working)),
            Phase::Resting => Some(Phase::Paused(BasePhase::Resting)),
            Phase::Onboarding | Phase::Paused(_) => None,
        }
    }

    /// `Paused(prev) -> prev`.
    pub fn resume(self) -> Option<Phase> {
        match self {
            Phase::Paused(base) => Some(base.into()),
            _ => None,
        }
    }

    /// The transition taken when the countdown of an active phase ends.
    pub fn expire(self) -> Option<Transition> {
        match self {
            Phase::Working => Some(Transition::new(BasePhase::Working, TransitionCause::Expired)),
            Phase::Resting => Some(Transition::new(BasePhase::Resting, TransitionCause::Expired)),
            _ => None,
        }
    }
}

/// Why a phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionCause {
    Expired,
    Skipped,
}

/// A `Working <-> Resting` edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: BasePhase,
    pub to: BasePhase,
    pub cause: TransitionCause,
}

impl Transition {
    fn new(from: BasePhase, cause: TransitionCause) -> Self {
        Self {
            from,
            to: from.next(),
            cause,
        }
    }
}

/// Configured length of each base phase, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub work_secs: f64,
    pub rest_secs: f64,
}

impl PhaseDurations {
    pub fn from_minutes(work_minutes: u32, rest_minutes: u32) -> Self {
        Self {
            work_secs: f64::from(work_minutes) * 60.0,
            rest_secs: f64::from(rest_minutes) * 60.0,
        }
    }

    pub fn for_phase(&self, base: BasePhase) -> f64 {
        match base {
            BasePhase::Working => self.work_secs,
            BasePhase::Resting => self.rest_secs,
        }
    }
}

/// Whether `skip` may end the current phase early.
///
/// Skipping is only allowed while more than half of the phase remains and
/// the timer is not paused. This is product policy: it stops skip from being
/// used to dodge nearly all of a rest.
pub fn skip_eligible(phase: Phase, remaining_secs: f64, total_secs: f64) -> bool {
    phase.is_active() && remaining_secs > total_secs / 2.0
}

/// Skip the current phase if policy allows.
pub fn skip(phase: Phase, remaining_secs: f64, total_secs: f64) -> Option<Transition> {
    if !skip_eligible(phase, remaining_secs, total_secs) {
        return None;
    }
    let base = phase.base()?;
    Some(Transition::new(base, TransitionCause::Skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_wraps_only_active_phases() {
        assert_eq!(Phase::Working.pause(), Some(Phase::Paused(BasePhase::Working)));
        assert_eq!(Phase::Resting.pause(), Some(Phase::Paused(BasePhase::Resting)));
        assert_eq!(Phase::Onboarding.pause(), None);
        assert_eq!(Phase::Paused(BasePhase::Working).pause(), None);
    }

    #[test]
    fn resume_unwraps_pause() {
        assert_eq!(Phase::Paused(BasePhase::Resting).resume(), Some(Phase::Resting));
        assert_eq!(Phase::Working.resume(), None);
    }

    #[test]
    fn paused_equality_follows_base_phase() {
        assert_eq!(Phase::Paused(BasePhase::Working), Phase::Paused(BasePhase::Working));
        assert_ne!(Phase::Paused(BasePhase::Working), Phase::Paused(BasePhase::Resting));
        assert_ne!(Phase::Paused(BasePhase::Working), Phase::Working);
    }

    #[test]
    fn base_unwraps_pause() {
        assert_eq!(Phase::Paused(BasePhase::Resting).base(), Some(BasePhase::Resting));
        assert_eq!(Phase::Onboarding.base(), None);
    }

    #[test]
    fn expire_alternates() {
        let t = Phase::Working.expire().unwrap();
        assert_eq!((t.from, t.to), (BasePhase::Working, BasePhase::Resting));
        let t = Phase::Resting.expire().unwrap();
        assert_eq!((t.from, t.to), (BasePhase::Resting, BasePhase::Working));
        assert!(Phase::Onboarding.expire().is_none());
        assert!(Phase::Paused(BasePhase::Working).expire().is_none());
    }

    #[test]
    fn onboarding_completes_into_working() {
        assert_eq!(Phase::Onboarding.complete_onboarding(), Some(Phase::Working));
        assert_eq!(Phase::Resting.complete_onboarding(), None);
    }

    #[test]
    fn skip_requires_more_than_half_remaining() {
        assert!(skip_eligible(Phase::Working, 1351.0, 2700.0));
        assert!(!skip_eligible(Phase::Working, 1350.0, 2700.0));
        assert!(!skip_eligible(Phase::Paused(BasePhase::Working), 2700.0, 2700.0));
        assert!(!skip_eligible(Phase::Onboarding, 10.0, 0.0));

        let t = skip(Phase::Resting, 600.0, 600.0).unwrap();
        assert_eq!(t.to, BasePhase::Working);
        assert_eq!(t.cause, TransitionCause::Skipped);
        assert!(skip(Phase::Resting, 100.0, 600.0).is_none());
    }

    #[test]
    fn serde_shape_is_tagged() {
        let json = serde_json::to_value(Phase::Paused(BasePhase::Working)).unwrap();
        assert_eq!(json["phase"], "paused");
        assert_eq!(json["resume_to"], "working");
        let back: Phase = serde_json::from_value(json).unwrap();
        assert_eq!(back, Phase::Paused(BasePhase::Working));
    }
}

//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based countdown. It does not use
//! internal threads - the caller is responsible for calling `tick()` periodically
//! and for passing in the current clock reading.
//!
//! Each tick recomputes `remaining = max(anchor_remaining - elapsed, 0)` from
//! the instant the run was anchored instead of decrementing, so late or
//! jittery ticks do not accumulate drift.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(PhaseDurations::from_minutes(45, 10));
//! engine.enter(BasePhase::Working);
//! engine.start(clock.now_ms());
//! // In a loop:
//! let outcome = engine.tick(clock.now_ms());
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::phase::{self, BasePhase, Phase, PhaseDurations, Transition};

/// Seconds before expiry at which the near-expiry alert fires.
pub const DEFAULT_NEAR_EXPIRY_SECS: f64 = 30.0;

/// Observable timer state.
///
/// `remaining_secs` is never negative, and `is_running` is never true while
/// the phase is `Onboarding` or `Paused`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: Phase,
    pub remaining_secs: f64,
    pub is_running: bool,
}

/// What a single tick produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// Seconds of a `Working` countdown consumed by this tick.
    pub worked_secs: f64,
    pub events: Vec<Event>,
}

/// Core timer engine.
///
/// Operates on clock deltas -- no internal thread.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    state: TimerState,
    durations: PhaseDurations,
    near_expiry_secs: f64,
    /// Remaining seconds at the moment the current run was anchored.
    anchor_remaining: f64,
    /// Clock reading (ms) at which the current run was anchored.
    anchored_at_ms: Option<u64>,
    /// Snapshot taken by `pause()`, restored by `resume()`.
    paused_remaining: f64,
}

impl TimerEngine {
    /// Create an engine in the `Onboarding` phase.
    pub fn new(durations: PhaseDurations) -> Self {
        Self {
            state: TimerState {
                phase: Phase::Onboarding,
                remaining_secs: 0.0,
                is_running: false,
            },
            durations,
            near_expiry_secs: DEFAULT_NEAR_EXPIRY_SECS,
            anchor_remaining: 0.0,
            anchored_at_ms: None,
            paused_remaining: 0.0,
        }
    }

    pub fn with_near_expiry_secs(mut self, secs: f64) -> Self {
        self.near_expiry_secs = secs.max(0.0);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn remaining_secs(&self) -> f64 {
        self.state.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn durations(&self) -> PhaseDurations {
        self.durations
    }

    /// Full configured length of the current base phase.
    pub fn total_secs(&self) -> f64 {
        self.state
            .phase
            .base()
            .map(|b| self.durations.for_phase(b))
            .unwrap_or(0.0)
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total <= 0.0 {
            return 0.0;
        }
        (1.0 - self.state.remaining_secs / total).clamp(0.0, 1.0)
    }

    pub fn can_skip(&self) -> bool {
        phase::skip_eligible(self.state.phase, self.state.remaining_secs, self.total_secs())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the configured durations. The running countdown keeps its
    /// current length; the new values apply at the next phase start or reset.
    pub fn set_durations(&mut self, durations: PhaseDurations) {
        self.durations = durations;
    }

    /// Put the engine at the start of `base` with the full duration, stopped.
    pub fn enter(&mut self, base: BasePhase) {
        self.stop();
        self.state.phase = base.into();
        self.state.remaining_secs = self.durations.for_phase(base);
        self.paused_remaining = self.state.remaining_secs;
    }

    /// `Onboarding -> Working` with the full work duration. Does not start
    /// the countdown.
    pub fn complete_onboarding(&mut self) -> bool {
        if self.state.phase.complete_onboarding().is_none() {
            return false;
        }
        self.enter(BasePhase::Working);
        true
    }

    pub fn start(&mut self, now_ms: u64) -> Option<Event> {
        if self.state.is_running {
            return None; // Already running.
        }
        let base = match self.state.phase {
            Phase::Working => BasePhase::Working,
            Phase::Resting => BasePhase::Resting,
            _ => return None,
        };
        self.run_from(now_ms);
        Some(Event::TimerStarted {
            phase: base,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Snapshot the remaining time and enter `Paused(current)`.
    ///
    /// Callers that want the snapshot to include time since the last tick
    /// should `tick()` first.
    pub fn pause(&mut self) -> Option<Event> {
        let paused = self.state.phase.pause()?;
        let resume_to = paused.base()?;
        self.paused_remaining = self.state.remaining_secs;
        self.stop();
        self.state.phase = paused;
        Some(Event::TimerPaused {
            resume_to,
            remaining_secs: self.paused_remaining,
            at: Utc::now(),
        })
    }

    /// Restore the pause snapshot and restart the countdown from `now_ms`.
    pub fn resume(&mut self, now_ms: u64) -> Option<Event> {
        let Phase::Paused(base) = self.state.phase else {
            return None;
        };
        self.state.phase = base.into();
        self.state.remaining_secs = self.paused_remaining;
        self.run_from(now_ms);
        Some(Event::TimerResumed {
            phase: base,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Stop and restore the full duration of the base phase. The phase itself
    /// is unchanged, so a paused timer stays paused (and resumes from the
    /// full duration).
    pub fn reset(&mut self) -> Option<Event> {
        let base = self.state.phase.base()?;
        self.stop();
        let full = self.durations.for_phase(base);
        self.state.remaining_secs = full;
        self.paused_remaining = full;
        Some(Event::TimerReset {
            phase: self.state.phase,
            remaining_secs: full,
            at: Utc::now(),
        })
    }

    /// End the current phase early when skip-eligible; otherwise a no-op.
    pub fn skip(&mut self, now_ms: u64) -> Option<Event> {
        let transition = phase::skip(
            self.state.phase,
            self.state.remaining_secs,
            self.total_secs(),
        )?;
        self.stop();
        Some(self.advance(transition, now_ms))
    }

    /// Call periodically while running.
    pub fn tick(&mut self, now_ms: u64) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if !self.state.is_running {
            return outcome;
        }
        let (Some(anchored_at), Some(base)) = (self.anchored_at_ms, self.state.phase.base()) else {
            return outcome;
        };

        let elapsed = now_ms.saturating_sub(anchored_at) as f64 / 1000.0;
        let remaining = (self.anchor_remaining - elapsed).max(0.0);
        let consumed = (self.state.remaining_secs - remaining).max(0.0);
        if base == BasePhase::Working {
            outcome.worked_secs = consumed;
        }

        // One-shot edge: only the tick that crosses the threshold fires.
        let crossed = self.state.remaining_secs > self.near_expiry_secs
            && remaining <= self.near_expiry_secs
            && remaining > 0.0;
        self.state.remaining_secs = remaining;

        if crossed {
            outcome.events.push(Event::NearExpiry {
                phase: base,
                remaining_secs: remaining,
                at: Utc::now(),
            });
        }

        if remaining <= 0.0 {
            if let Some(transition) = self.state.phase.expire() {
                self.stop();
                outcome.events.push(self.advance(transition, now_ms));
            }
        }
        outcome
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn run_from(&mut self, now_ms: u64) {
        self.anchor_remaining = self.state.remaining_secs;
        self.anchored_at_ms = Some(now_ms);
        self.state.is_running = true;
    }

    fn stop(&mut self) {
        self.state.is_running = false;
        self.anchored_at_ms = None;
    }

    /// Enter the next phase with its full duration and restart the countdown.
    fn advance(&mut self, transition: Transition, now_ms: u64) -> Event {
        let duration = self.durations.for_phase(transition.to);
        self.state.phase = transition.to.into();
        self.state.remaining_secs = duration;
        self.paused_remaining = duration;
        self.run_from(now_ms);
        Event::PhaseChanged {
            from: transition.from,
            to: transition.to,
            cause: transition.cause,
            duration_secs: duration,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::TransitionCause;

    fn working_engine() -> TimerEngine {
        let mut engine = TimerEngine::new(PhaseDurations::from_minutes(45, 10));
        engine.enter(BasePhase::Working);
        engine
    }

    fn phase_changes(events: &[Event]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, Event::PhaseChanged { .. }))
            .count()
    }

    #[test]
    fn new_engine_is_onboarding_and_cannot_start() {
        let mut engine = TimerEngine::new(PhaseDurations::from_minutes(45, 10));
        assert_eq!(engine.phase(), Phase::Onboarding);
        assert!(engine.start(0).is_none());
        assert!(!engine.is_running());
        assert!(engine.pause().is_none());
        assert!(engine.reset().is_none());
    }

    #[test]
    fn complete_onboarding_loads_work_duration() {
        let mut engine = TimerEngine::new(PhaseDurations::from_minutes(45, 10));
        assert!(engine.complete_onboarding());
        assert_eq!(engine.phase(), Phase::Working);
        assert_eq!(engine.remaining_secs(), 2700.0);
        assert!(!engine.is_running());
        assert!(!engine.complete_onboarding());
    }

    #[test]
    fn start_is_idempotent() {
        let mut engine = working_engine();
        assert!(engine.start(0).is_some());
        assert!(engine.start(5_000).is_none());
        engine.tick(10_000);
        assert_eq!(engine.remaining_secs(), 2690.0);
    }

    #[test]
    fn tick_recomputes_from_anchor() {
        let mut engine = working_engine();
        engine.start(1_000);
        let outcome = engine.tick(1_100);
        assert!((engine.remaining_secs() - 2699.9).abs() < 1e-9);
        assert!((outcome.worked_secs - 0.1).abs() < 1e-9);

        // A late tick catches up in one step.
        let outcome = engine.tick(61_000);
        assert_eq!(engine.remaining_secs(), 2640.0);
        assert!((outcome.worked_secs - 59.9).abs() < 1e-9);
    }

    #[test]
    fn expiry_transitions_once_and_restarts() {
        let mut engine = working_engine();
        engine.start(0);
        let outcome = engine.tick(2_700_000);
        assert_eq!(phase_changes(&outcome.events), 1);
        assert_eq!(engine.phase(), Phase::Resting);
        assert_eq!(engine.remaining_secs(), 600.0);
        assert!(engine.is_running());

        let outcome = engine.tick(2_700_100);
        assert_eq!(phase_changes(&outcome.events), 0);
        assert!((engine.remaining_secs() - 599.9).abs() < 1e-9);
    }

    #[test]
    fn rest_expiry_returns_to_work() {
        let mut engine = working_engine();
        engine.start(0);
        engine.tick(2_700_000);
        let outcome = engine.tick(3_300_000);
        match &outcome.events[..] {
            [Event::NearExpiry { .. }, Event::PhaseChanged { from, to, cause, .. }]
            | [Event::PhaseChanged { from, to, cause, .. }] => {
                assert_eq!(*from, BasePhase::Resting);
                assert_eq!(*to, BasePhase::Working);
                assert_eq!(*cause, TransitionCause::Expired);
            }
            other => panic!("unexpected events: {other:?}"),
        }
        assert_eq!(engine.phase(), Phase::Working);
        assert_eq!(engine.remaining_secs(), 2700.0);
    }

    #[test]
    fn near_expiry_fires_once_per_crossing() {
        let mut engine = working_engine();
        engine.start(0);
        let mut alerts = 0;
        let mut now = 0;
        while now < 2_699_000 {
            now += 100;
            alerts += engine
                .tick(now)
                .events
                .iter()
                .filter(|e| matches!(e, Event::NearExpiry { .. }))
                .count();
        }
        assert_eq!(alerts, 1);

        // Reset puts it above the threshold again; a new crossing alerts again.
        engine.reset();
        engine.start(now);
        let outcome = engine.tick(now + 2_670_000);
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e, Event::NearExpiry { .. })));
    }

    #[test]
    fn pause_resume_preserves_remaining() {
        let mut engine = working_engine();
        engine.start(0);
        engine.tick(100_000);
        assert!(engine.pause().is_some());
        assert_eq!(engine.phase(), Phase::Paused(BasePhase::Working));
        assert!(!engine.is_running());

        // Ticks while paused change nothing.
        assert_eq!(engine.tick(900_000), TickOutcome::default());

        assert!(engine.resume(5_000_000).is_some());
        assert_eq!(engine.phase(), Phase::Working);
        assert_eq!(engine.remaining_secs(), 2600.0);
        assert!(engine.is_running());

        engine.tick(5_010_000);
        assert_eq!(engine.remaining_secs(), 2590.0);
    }

    #[test]
    fn double_pause_is_noop() {
        let mut engine = working_engine();
        engine.pause();
        assert!(engine.pause().is_none());
        assert_eq!(engine.phase(), Phase::Paused(BasePhase::Working));
    }

    #[test]
    fn reset_keeps_phase_and_stops() {
        let mut engine = working_engine();
        engine.start(0);
        engine.tick(2_700_000);
        engine.tick(2_800_000);
        engine.pause();

        let event = engine.reset().unwrap();
        assert!(matches!(event, Event::TimerReset { phase: Phase::Paused(BasePhase::Resting), .. }));
        assert_eq!(engine.phase(), Phase::Paused(BasePhase::Resting));
        assert_eq!(engine.remaining_secs(), 600.0);
        assert!(!engine.is_running());

        engine.resume(3_000_000);
        assert_eq!(engine.remaining_secs(), 600.0);
    }

    #[test]
    fn skip_only_in_first_half() {
        let mut engine = working_engine();
        engine.start(0);
        engine.tick(1_400_000);
        assert!(!engine.can_skip());
        assert!(engine.skip(1_400_000).is_none());
        assert_eq!(engine.phase(), Phase::Working);
        assert!(engine.is_running());

        let mut engine = working_engine();
        engine.start(0);
        engine.tick(60_000);
        let event = engine.skip(60_000).unwrap();
        assert!(matches!(
            event,
            Event::PhaseChanged { cause: TransitionCause::Skipped, to: BasePhase::Resting, .. }
        ));
        assert_eq!(engine.remaining_secs(), 600.0);
        assert!(engine.is_running());
    }

    #[test]
    fn skip_while_paused_is_noop() {
        let mut engine = working_engine();
        engine.pause();
        assert!(engine.skip(0).is_none());
        assert_eq!(engine.phase(), Phase::Paused(BasePhase::Working));
    }

    #[test]
    fn new_durations_apply_on_reset() {
        let mut engine = working_engine();
        engine.start(0);
        engine.set_durations(PhaseDurations::from_minutes(25, 5));
        engine.tick(1_000);
        assert_eq!(engine.remaining_secs(), 2699.0);
        engine.reset();
        assert_eq!(engine.remaining_secs(), 1500.0);
    }
}

//! Accumulated work time.
//!
//! Only the tick path writes here. Day and week boundaries are not tracked:
//! a calendar-aware caller decides when to call [`Statistics::reset_today`]
//! and [`Statistics::reset_week`].

use serde::{Deserialize, Serialize};

use crate::phase::Phase;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub today_secs: f64,
    pub week_secs: f64,
}

impl Statistics {
    pub fn record_work(&mut self, secs: f64) {
        if secs > 0.0 {
            self.today_secs += secs;
            self.week_secs += secs;
        }
    }

    pub fn reset_today(&mut self) {
        self.today_secs = 0.0;
    }

    pub fn reset_week(&mut self) {
        self.week_secs = 0.0;
    }
}

/// Adds worked seconds from ticks and remembers whether anything changed
/// since the last persist.
#[derive(Debug, Clone, Default)]
pub struct StatisticsAccumulator {
    stats: Statistics,
    dirty: bool,
}

impl StatisticsAccumulator {
    pub fn new(stats: Statistics) -> Self {
        Self {
            stats,
            dirty: false,
        }
    }

    pub fn stats(&self) -> Statistics {
        self.stats
    }

    /// Credit `elapsed_secs` if the tick ran in the `Working` phase.
    pub fn on_tick(&mut self, phase: Phase, running: bool, elapsed_secs: f64) {
        if running && phase == Phase::Working && elapsed_secs > 0.0 {
            self.stats.record_work(elapsed_secs);
            self.dirty = true;
        }
    }

    pub fn reset_today(&mut self) {
        self.stats.reset_today();
        self.dirty = true;
    }

    pub fn reset_week(&mut self) {
        self.stats.reset_week();
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::BasePhase;

    #[test]
    fn only_running_work_counts() {
        let mut acc = StatisticsAccumulator::default();
        acc.on_tick(Phase::Working, true, 0.5);
        acc.on_tick(Phase::Resting, true, 10.0);
        acc.on_tick(Phase::Working, false, 10.0);
        acc.on_tick(Phase::Paused(BasePhase::Working), true, 10.0);
        assert_eq!(acc.stats().today_secs, 0.5);
        assert_eq!(acc.stats().week_secs, 0.5);
        assert!(acc.is_dirty());
    }

    #[test]
    fn resets_are_independent() {
        let mut acc = StatisticsAccumulator::new(Statistics {
            today_secs: 100.0,
            week_secs: 500.0,
        });
        assert!(!acc.is_dirty());
        acc.reset_today();
        assert_eq!(acc.stats().today_secs, 0.0);
        assert_eq!(acc.stats().week_secs, 500.0);
        acc.mark_clean();
        acc.reset_week();
        assert_eq!(acc.stats().week_secs, 0.0);
        assert!(acc.is_dirty());
    }
}

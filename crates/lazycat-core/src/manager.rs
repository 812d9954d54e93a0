//! The state manager: single owner of timer state, preferences and statistics.
//!
//! Every mutation goes through `&mut self`, so commands and ticks are
//! serialized by construction. [`crate::runtime`] wraps a manager in a tokio
//! task for hosts that want a background tick loop.
//!
//! Persistence failures never roll back in-memory state. Mutators that write
//! through return `Err(CoreError::Store(_))` *after* applying the change;
//! treat that as a warning. Onboarding returns `Err(CoreError::Unsaved { .. })`
//! instead, so the completion event is not lost. Validation errors reject the
//! change.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::effects::{Effects, SideEffectDispatcher};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::format;
use crate::onboarding::{self, OnboardingProfile, Recommendation};
use crate::phase::{BasePhase, Phase, Transition};
use crate::statistics::{Statistics, StatisticsAccumulator};
use crate::storage::{AppConfig, DarkMode, Preferences, SettingsStore};
use crate::timer::{Clock, TimerEngine, TimerState, DEFAULT_NEAR_EXPIRY_SECS};

/// Knobs that are not user preferences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManagerOptions {
    pub near_expiry_secs: f64,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            near_expiry_secs: DEFAULT_NEAR_EXPIRY_SECS,
        }
    }
}

impl From<&AppConfig> for ManagerOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            near_expiry_secs: config.timer.near_expiry_secs as f64,
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub phase: Phase,
    pub base_phase: Option<BasePhase>,
    pub remaining_secs: f64,
    pub total_secs: f64,
    pub progress: f64,
    pub is_paused: bool,
    pub is_running: bool,
    pub can_skip: bool,
    /// `mm:ss`
    pub clock: String,
    pub status: String,
    pub statistics: Statistics,
    pub today: String,
    pub week: String,
    pub dark_mode: DarkMode,
}

pub struct StateManager {
    engine: TimerEngine,
    preferences: Preferences,
    profile: Option<OnboardingProfile>,
    stats: StatisticsAccumulator,
    settings: SettingsStore,
    effects: SideEffectDispatcher,
    clock: Box<dyn Clock>,
}

impl StateManager {
    /// Load persisted state and set up the initial phase.
    ///
    /// A returning user lands in `Working` with the full work duration
    /// (stopped) and the work track playing if music is enabled; a first run
    /// lands in `Onboarding`.
    pub fn new(
        settings: SettingsStore,
        effects: Effects,
        clock: impl Clock + 'static,
        options: ManagerOptions,
    ) -> Self {
        let preferences = settings.load();
        let stats = settings.load_statistics();
        let profile = settings.load_profile();
        let onboarded = settings.is_onboarding_complete();

        let mut engine = TimerEngine::new(preferences.durations())
            .with_near_expiry_secs(options.near_expiry_secs);
        let mut effects = SideEffectDispatcher::new(effects);
        effects.request_permission();

        if onboarded {
            engine.enter(BasePhase::Working);
            effects.sync_music(Some(BasePhase::Working), &preferences);
        }
        tracing::info!(phase = ?engine.phase(), onboarded, "state manager ready");

        Self {
            engine,
            preferences,
            profile,
            stats: StatisticsAccumulator::new(stats),
            settings,
            effects,
            clock: Box::new(clock),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.engine.state()
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    pub fn remaining_secs(&self) -> f64 {
        self.engine.remaining_secs()
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn can_skip(&self) -> bool {
        self.engine.can_skip()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn profile(&self) -> Option<&OnboardingProfile> {
        self.profile.as_ref()
    }

    pub fn statistics(&self) -> Statistics {
        self.stats.stats()
    }

    pub fn view(&self) -> View {
        let state = self.engine.state();
        let stats = self.stats.stats();
        View {
            phase: state.phase,
            base_phase: state.phase.base(),
            remaining_secs: state.remaining_secs,
            total_secs: self.engine.total_secs(),
            progress: self.engine.progress(),
            is_paused: state.phase.is_paused(),
            is_running: state.is_running,
            can_skip: self.engine.can_skip(),
            clock: format::format_clock(state.remaining_secs),
            status: format::status_text(state.phase).to_string(),
            statistics: stats,
            today: format::format_hours(stats.today_secs),
            week: format::format_hours(stats.week_secs),
            dark_mode: self.preferences.dark_mode,
        }
    }

    // ── Onboarding ───────────────────────────────────────────────────

    pub fn recommend(profile: &OnboardingProfile) -> Recommendation {
        onboarding::recommend(profile)
    }

    /// Finish onboarding. With a profile, its recommendation replaces the
    /// work/rest durations; without one the current durations are kept.
    ///
    /// Returns `Ok(None)` if onboarding was already complete, and
    /// [`CoreError::Unsaved`] carrying the completion event if the phase
    /// changed but the store rejected the write.
    pub fn complete_onboarding(&mut self, profile: Option<OnboardingProfile>) -> Result<Option<Event>> {
        let mut preferences = self.preferences;
        if let Some(profile) = &profile {
            profile.validate()?;
            let rec = onboarding::recommend(profile);
            preferences.work_minutes = rec.work_minutes;
            preferences.rest_minutes = rec.rest_minutes;
        }
        self.complete_onboarding_with(profile, preferences)
    }

    /// Finish onboarding with explicitly chosen preferences (e.g. after the
    /// user adjusted the recommendation).
    pub fn complete_onboarding_with(
        &mut self,
        profile: Option<OnboardingProfile>,
        preferences: Preferences,
    ) -> Result<Option<Event>> {
        if self.engine.phase() != Phase::Onboarding {
            return Ok(None);
        }
        preferences.validate()?;
        self.preferences = preferences;
        if profile.is_some() {
            self.profile = profile;
        }
        self.engine.set_durations(self.preferences.durations());
        self.engine.complete_onboarding();
        self.effects.sync_music(Some(BasePhase::Working), &self.preferences);
        tracing::info!(
            work_minutes = self.preferences.work_minutes,
            rest_minutes = self.preferences.rest_minutes,
            "onboarding complete"
        );

        let event = Event::OnboardingCompleted {
            work_minutes: self.preferences.work_minutes,
            rest_minutes: self.preferences.rest_minutes,
            at: Utc::now(),
        };
        match self
            .settings
            .complete_onboarding(&self.preferences, self.profile.as_ref())
        {
            Ok(()) => Ok(Some(event)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist onboarding");
                Err(CoreError::Unsaved {
                    event: Box::new(event),
                    source: e,
                })
            }
        }
    }

    // ── Timer commands ───────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let event = self.engine.start(now);
        if event.is_some() {
            tracing::debug!(phase = ?self.engine.phase(), "timer started");
        }
        event
    }

    /// Flush elapsed time, then snapshot and pause.
    pub fn pause(&mut self) -> Vec<Event> {
        let mut events = self.tick();
        if let Some(event) = self.engine.pause() {
            tracing::debug!(remaining = self.engine.remaining_secs(), "timer paused");
            events.push(event);
            self.persist_statistics();
        }
        events
    }

    pub fn resume(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let event = self.engine.resume(now);
        if event.is_some() {
            tracing::debug!(remaining = self.engine.remaining_secs(), "timer resumed");
        }
        event
    }

    /// Stop and restore the full duration of the base phase. Does not restart.
    pub fn reset(&mut self) -> Vec<Event> {
        let mut events = self.tick();
        events.extend(self.engine.reset());
        events
    }

    /// End the phase early when more than half of it remains.
    pub fn skip(&mut self) -> Vec<Event> {
        let mut events = self.tick();
        let now = self.clock.now_ms();
        if let Some(event) = self.engine.skip(now) {
            self.on_event(&event);
            events.push(event);
        } else {
            tracing::debug!(phase = ?self.engine.phase(), "skip not eligible");
        }
        events
    }

    /// The single tick handler: advance the countdown, credit work time and
    /// fire edge-triggered side effects.
    pub fn tick(&mut self) -> Vec<Event> {
        let before = self.engine.state();
        let now = self.clock.now_ms();
        let outcome = self.engine.tick(now);
        self.stats
            .on_tick(before.phase, before.is_running, outcome.worked_secs);
        for event in &outcome.events {
            self.on_event(event);
        }
        outcome.events
    }

    fn on_event(&mut self, event: &Event) {
        match *event {
            Event::PhaseChanged { from, to, cause, .. } => {
                tracing::info!(from = from.as_str(), to = to.as_str(), ?cause, "phase changed");
                self.effects
                    .on_transition(Transition { from, to, cause }, &self.preferences);
                self.persist_statistics();
            }
            Event::NearExpiry { phase, .. } => self.effects.on_near_expiry(phase),
            _ => {}
        }
    }

    // ── Settings ─────────────────────────────────────────────────────

    /// Replace all preferences at once and persist them in one batch.
    pub fn update_preferences(&mut self, preferences: Preferences) -> Result<()> {
        preferences.validate()?;
        let music_changed = preferences.music_enabled != self.preferences.music_enabled;
        let volume_changed = preferences.music_volume != self.preferences.music_volume;
        self.preferences = preferences;
        self.engine.set_durations(preferences.durations());
        if music_changed {
            self.effects
                .sync_music(self.engine.phase().base(), &self.preferences);
        } else if volume_changed {
            self.effects.set_volume(preferences.music_volume);
        }
        self.persist_preferences()
    }

    /// Set one preference from its string form, e.g. `("rest_minutes", "15")`.
    pub fn set_preference(&mut self, field: &str, value: &str) -> Result<()> {
        let mut next = self.preferences;
        next.set_field(field, value)?;
        self.update_preferences(next)
    }

    pub fn set_work_minutes(&mut self, minutes: u32) -> Result<()> {
        self.update_preferences(Preferences {
            work_minutes: minutes,
            ..self.preferences
        })
    }

    pub fn set_rest_minutes(&mut self, minutes: u32) -> Result<()> {
        self.update_preferences(Preferences {
            rest_minutes: minutes,
            ..self.preferences
        })
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) -> Result<()> {
        self.update_preferences(Preferences {
            sound_enabled: enabled,
            ..self.preferences
        })
    }

    pub fn set_vibration_enabled(&mut self, enabled: bool) -> Result<()> {
        self.update_preferences(Preferences {
            vibration_enabled: enabled,
            ..self.preferences
        })
    }

    /// Turning music on starts the track for the current base phase; turning
    /// it off stops playback.
    pub fn set_music_enabled(&mut self, enabled: bool) -> Result<()> {
        self.update_preferences(Preferences {
            music_enabled: enabled,
            ..self.preferences
        })
    }

    pub fn set_music_volume(&mut self, volume: f32) -> Result<()> {
        self.update_preferences(Preferences {
            music_volume: volume,
            ..self.preferences
        })
    }

    pub fn set_dark_mode(&mut self, mode: DarkMode) -> Result<()> {
        self.update_preferences(Preferences {
            dark_mode: mode,
            ..self.preferences
        })
    }

    /// Restore default preferences (music volume is kept).
    pub fn reset_preferences(&mut self) -> Result<()> {
        let mut next = self.preferences;
        next.reset_to_defaults();
        self.update_preferences(next)
    }

    // ── Statistics ───────────────────────────────────────────────────

    /// For the calendar-aware collaborator at a day boundary.
    pub fn reset_today(&mut self) -> Result<()> {
        self.stats.reset_today();
        self.flush()
    }

    /// For the calendar-aware collaborator at a week boundary.
    pub fn reset_week(&mut self) -> Result<()> {
        self.stats.reset_week();
        self.flush()
    }

    /// Persist statistics if they changed since the last write.
    pub fn flush(&mut self) -> Result<()> {
        if !self.stats.is_dirty() {
            return Ok(());
        }
        self.settings.save_statistics(&self.stats.stats())?;
        self.stats.mark_clean();
        Ok(())
    }

    /// Final tick, persist everything and stop music.
    pub fn shutdown(&mut self) -> Result<()> {
        self.tick();
        self.effects.stop_music();
        self.settings
            .save_all(&self.preferences, &self.stats.stats())?;
        self.stats.mark_clean();
        tracing::info!("state manager shut down");
        Ok(())
    }

    fn persist_statistics(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "failed to persist statistics");
        }
    }

    fn persist_preferences(&mut self) -> Result<()> {
        self.settings
            .save(&self.preferences)
            .inspect_err(|e| tracing::warn!(error = %e, "failed to persist preferences"))
            .map_err(CoreError::from)
    }
}

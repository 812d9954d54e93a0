//! Fires side effects at phase edges.
//!
//! Each collaborator call is isolated: an error is logged and the remaining
//! effects still fire. Nothing here can fail the caller or touch timer state.

use super::{
    Effects, HapticPattern, Notification, Tone, Track, WORK_COMPLETE_CATEGORY,
};
use crate::error::EffectError;
use crate::phase::{BasePhase, Transition};
use crate::storage::Preferences;

pub struct SideEffectDispatcher {
    effects: Effects,
    notifications_allowed: bool,
}

fn track_for(base: BasePhase) -> Track {
    match base {
        BasePhase::Working => Track::Work,
        BasePhase::Resting => Track::Rest,
    }
}

impl SideEffectDispatcher {
    pub fn new(effects: Effects) -> Self {
        Self {
            effects,
            notifications_allowed: true,
        }
    }

    pub fn notifications_allowed(&self) -> bool {
        self.notifications_allowed
    }

    /// Ask for notification permission once. A refusal is remembered and
    /// never retried.
    pub fn request_permission(&mut self) {
        match self.effects.notifier.request_permission() {
            Ok(()) => {}
            Err(EffectError::PermissionDenied(reason)) => {
                tracing::warn!(%reason, "notification permission denied, continuing silently");
                self.notifications_allowed = false;
            }
            Err(e) => tracing::warn!(error = %e, "notification permission request failed"),
        }
    }

    /// `Working -> Resting` and `Resting -> Working` cues.
    pub fn on_transition(&mut self, transition: Transition, prefs: &Preferences) {
        tracing::debug!(from = ?transition.from, to = ?transition.to, cause = ?transition.cause, "dispatching transition effects");
        let (notification, pattern, tone) = match transition.to {
            BasePhase::Resting => (
                Notification::new(
                    "Time for a break!",
                    format!("Stand up and move around for {} minutes.", prefs.rest_minutes),
                )
                .with_category(WORK_COMPLETE_CATEGORY),
                HapticPattern::WorkComplete,
                Tone::WorkComplete,
            ),
            BasePhase::Working => (
                Notification::new("Break's over", "Time to get back to work!"),
                HapticPattern::RestComplete,
                Tone::RestComplete,
            ),
        };

        self.notify(&notification);
        if prefs.vibration_enabled {
            report("haptic", self.effects.haptics.play_pattern(pattern));
        }
        if prefs.sound_enabled {
            report("sound", self.effects.sound.play_tone(tone));
        }
        self.sync_music(Some(transition.to), prefs);
    }

    /// Near-expiry alert. Plays regardless of `sound_enabled`, matching the
    /// shipped behavior.
    // TODO: confirm with product whether the alert should honor sound_enabled.
    pub fn on_near_expiry(&mut self, phase: BasePhase) {
        tracing::debug!(?phase, "near-expiry alert");
        report("sound", self.effects.sound.play_tone(Tone::NearExpiry));
    }

    /// Play the track for `base` when music is enabled, otherwise stop.
    /// Onboarding (`None`) leaves music alone unless it must be stopped.
    pub fn sync_music(&mut self, base: Option<BasePhase>, prefs: &Preferences) {
        if !prefs.music_enabled {
            self.stop_music();
            return;
        }
        let Some(base) = base else {
            return;
        };
        let track = track_for(base);
        let music = &mut self.effects.music;
        if music.is_playing() && music.current_track() == Some(track) {
            return;
        }
        report("music", music.set_volume(prefs.music_volume));
        report("music", music.play(track, true));
    }

    pub fn stop_music(&mut self) {
        if self.effects.music.is_playing() {
            report("music", self.effects.music.stop());
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        report("music", self.effects.music.set_volume(volume));
    }

    fn notify(&mut self, notification: &Notification) {
        if !self.notifications_allowed {
            return;
        }
        match self.effects.notifier.schedule(notification) {
            Ok(()) => {}
            Err(EffectError::PermissionDenied(reason)) => {
                tracing::warn!(%reason, "notifications denied, disabling");
                self.notifications_allowed = false;
            }
            Err(e) => tracing::warn!(error = %e, "notification failed"),
        }
    }
}

fn report(capability: &str, result: Result<(), EffectError>) {
    if let Err(e) = result {
        tracing::warn!(capability, error = %e, "side effect failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::recording::{EffectCall, Recorder};
    use crate::phase::{Phase, TransitionCause};

    fn to_rest() -> Transition {
        Phase::Working.expire().unwrap()
    }

    fn to_work() -> Transition {
        Phase::Resting.expire().unwrap()
    }

    #[test]
    fn work_to_rest_fires_full_set() {
        let recorder = Recorder::new();
        let mut dispatcher = SideEffectDispatcher::new(recorder.effects());
        dispatcher.on_transition(to_rest(), &Preferences::default());

        let notes = recorder.notifications();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].body.contains("10 minutes"));
        assert_eq!(notes[0].category.as_deref(), Some(WORK_COMPLETE_CATEGORY));
        assert_eq!(recorder.haptics(), vec![HapticPattern::WorkComplete]);
        assert_eq!(recorder.tones(), vec![Tone::WorkComplete]);
        assert_eq!(recorder.current_track(), Some(Track::Rest));
    }

    #[test]
    fn rest_to_work_uses_pattern_b() {
        let recorder = Recorder::new();
        let mut dispatcher = SideEffectDispatcher::new(recorder.effects());
        dispatcher.on_transition(to_work(), &Preferences::default());
        assert_eq!(recorder.haptics(), vec![HapticPattern::RestComplete]);
        assert_eq!(recorder.tones(), vec![Tone::RestComplete]);
        assert_eq!(recorder.current_track(), Some(Track::Work));
        assert_eq!(recorder.notifications()[0].category, None);
    }

    #[test]
    fn disabled_flags_suppress_cues_but_not_notification() {
        let recorder = Recorder::new();
        let mut dispatcher = SideEffectDispatcher::new(recorder.effects());
        let prefs = Preferences {
            sound_enabled: false,
            vibration_enabled: false,
            ..Preferences::default()
        };
        dispatcher.on_transition(to_rest(), &prefs);
        assert_eq!(recorder.notifications().len(), 1);
        assert!(recorder.haptics().is_empty());
        assert!(recorder.tones().is_empty());
        assert_eq!(recorder.current_track(), Some(Track::Rest));
    }

    #[test]
    fn music_disabled_stops_playback() {
        let recorder = Recorder::new();
        let mut dispatcher = SideEffectDispatcher::new(recorder.effects());
        dispatcher.sync_music(Some(BasePhase::Working), &Preferences::default());
        let prefs = Preferences {
            music_enabled: false,
            ..Preferences::default()
        };
        dispatcher.on_transition(to_rest(), &prefs);
        assert_eq!(recorder.current_track(), None);
        assert_eq!(recorder.music_calls().last(), Some(&EffectCall::MusicStop));
    }

    #[test]
    fn same_track_is_not_restarted() {
        let recorder = Recorder::new();
        let mut dispatcher = SideEffectDispatcher::new(recorder.effects());
        let prefs = Preferences::default();
        dispatcher.sync_music(Some(BasePhase::Working), &prefs);
        dispatcher.sync_music(Some(BasePhase::Working), &prefs);
        assert_eq!(recorder.music_calls(), vec![EffectCall::MusicPlay(Track::Work)]);
    }

    #[test]
    fn near_expiry_ignores_sound_flag() {
        let recorder = Recorder::new();
        let mut dispatcher = SideEffectDispatcher::new(recorder.effects());
        dispatcher.on_near_expiry(BasePhase::Working);
        assert_eq!(recorder.tones(), vec![Tone::NearExpiry]);
    }

    #[test]
    fn one_failure_does_not_block_the_rest() {
        let recorder = Recorder::new();
        recorder.fail_sounds();
        recorder.fail_haptics();
        let mut dispatcher = SideEffectDispatcher::new(recorder.effects());
        dispatcher.on_transition(to_rest(), &Preferences::default());
        assert_eq!(recorder.notifications().len(), 1);
        assert_eq!(recorder.current_track(), Some(Track::Rest));
    }

    #[test]
    fn permission_denial_is_sticky() {
        let recorder = Recorder::new();
        recorder.deny_notifications();
        let mut dispatcher = SideEffectDispatcher::new(recorder.effects());
        dispatcher.request_permission();
        assert!(!dispatcher.notifications_allowed());

        dispatcher.on_transition(to_rest(), &Preferences::default());
        dispatcher.on_transition(to_work(), &Preferences::default());
        let requests = recorder
            .calls()
            .iter()
            .filter(|c| matches!(c, EffectCall::PermissionRequested))
            .count();
        assert_eq!(requests, 1);
        assert!(recorder.notifications().is_empty());
        assert_eq!(recorder.tones().len(), 2);
    }

    #[test]
    fn skipped_transition_fires_same_cues() {
        let recorder = Recorder::new();
        let mut dispatcher = SideEffectDispatcher::new(recorder.effects());
        let t = crate::phase::skip(Phase::Working, 2700.0, 2700.0).unwrap();
        assert_eq!(t.cause, TransitionCause::Skipped);
        dispatcher.on_transition(t, &Preferences::default());
        assert_eq!(recorder.haptics(), vec![HapticPattern::WorkComplete]);
    }
}

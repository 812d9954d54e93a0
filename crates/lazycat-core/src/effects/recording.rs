//! Recording collaborators for tests. Built with `cfg(test)` or the
//! `test-util` feature.
//!
//! [`Recorder::effects`] hands out an [`Effects`] bundle whose calls land in a
//! shared log that the test keeps a handle to. Failures can be switched on
//! per capability.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{Effects, HapticPattern, Haptics, MusicPlayer, Notification, Notifier, SoundPlayer, Tone, Track};
use crate::error::EffectError;

#[derive(Debug, Clone, PartialEq)]
pub enum EffectCall {
    PermissionRequested,
    Notified(Notification),
    Haptic(HapticPattern),
    Tone(Tone),
    MusicPlay(Track),
    MusicStop,
    Volume(f32),
}

#[derive(Debug, Default)]
struct Shared {
    calls: Vec<EffectCall>,
    track: Option<Track>,
    deny_notifications: bool,
    missing_sounds: bool,
    missing_haptics: bool,
    broken_music: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Recorder {
    shared: Arc<Mutex<Shared>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn effects(&self) -> Effects {
        Effects {
            notifier: Box::new(self.clone()),
            haptics: Box::new(self.clone()),
            sound: Box::new(self.clone()),
            music: Box::new(self.clone()),
        }
    }

    pub fn calls(&self) -> Vec<EffectCall> {
        self.lock().calls.clone()
    }

    pub fn clear(&self) {
        self.lock().calls.clear();
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EffectCall::Notified(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn haptics(&self) -> Vec<HapticPattern> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EffectCall::Haptic(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn tones(&self) -> Vec<Tone> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EffectCall::Tone(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn music_calls(&self) -> Vec<EffectCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, EffectCall::MusicPlay(_) | EffectCall::MusicStop))
            .collect()
    }

    pub fn current_track(&self) -> Option<Track> {
        self.lock().track
    }

    /// Permission requests and every notification fail with `PermissionDenied`.
    pub fn deny_notifications(&self) {
        self.lock().deny_notifications = true;
    }

    /// Tones fail with `ResourceMissing`.
    pub fn fail_sounds(&self) {
        self.lock().missing_sounds = true;
    }

    /// Haptic patterns fail with `ResourceMissing`.
    pub fn fail_haptics(&self) {
        self.lock().missing_haptics = true;
    }

    /// Music calls fail and never change the current track.
    pub fn fail_music(&self) {
        self.lock().broken_music = true;
    }
}

impl Notifier for Recorder {
    fn request_permission(&mut self) -> Result<(), EffectError> {
        let mut shared = self.lock();
        shared.calls.push(EffectCall::PermissionRequested);
        if shared.deny_notifications {
            return Err(EffectError::PermissionDenied("notifications".into()));
        }
        Ok(())
    }

    fn schedule(&mut self, notification: &Notification) -> Result<(), EffectError> {
        let mut shared = self.lock();
        if shared.deny_notifications {
            return Err(EffectError::PermissionDenied("notifications".into()));
        }
        shared.calls.push(EffectCall::Notified(notification.clone()));
        Ok(())
    }
}

impl Haptics for Recorder {
    fn play_pattern(&mut self, pattern: HapticPattern) -> Result<(), EffectError> {
        let mut shared = self.lock();
        if shared.missing_haptics {
            return Err(EffectError::ResourceMissing(format!("{pattern:?}")));
        }
        shared.calls.push(EffectCall::Haptic(pattern));
        Ok(())
    }
}

impl SoundPlayer for Recorder {
    fn play_tone(&mut self, tone: Tone) -> Result<(), EffectError> {
        let mut shared = self.lock();
        if shared.missing_sounds {
            return Err(EffectError::ResourceMissing(tone.asset_name().into()));
        }
        shared.calls.push(EffectCall::Tone(tone));
        Ok(())
    }
}

impl MusicPlayer for Recorder {
    fn play(&mut self, track: Track, _looped: bool) -> Result<(), EffectError> {
        let mut shared = self.lock();
        if shared.broken_music {
            return Err(EffectError::ResourceMissing(track.asset_name().into()));
        }
        shared.calls.push(EffectCall::MusicPlay(track));
        shared.track = Some(track);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EffectError> {
        let mut shared = self.lock();
        if shared.broken_music {
            return Err(EffectError::Failed("music output unavailable".into()));
        }
        shared.calls.push(EffectCall::MusicStop);
        shared.track = None;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), EffectError> {
        self.lock().calls.push(EffectCall::Volume(volume));
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.lock().track.is_some()
    }

    fn current_track(&self) -> Option<Track> {
        self.lock().track
    }
}

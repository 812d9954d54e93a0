//! Side-effect collaborators.
//!
//! The core never talks to a platform API directly. Notifications, haptics,
//! tones and background music go through the traits below, which the host
//! (CLI, GUI, tests) implements. Every call is fire-and-forget: an
//! implementation must return promptly and hand slow work to its own thread.

mod dispatcher;
#[cfg(any(test, feature = "test-util"))]
pub mod recording;

pub use dispatcher::SideEffectDispatcher;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EffectError;

/// Category attached to the work-complete notification.
pub const WORK_COMPLETE_CATEGORY: &str = "WORK_COMPLETE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique per request.
    pub id: String,
    pub title: String,
    pub body: String,
    pub category: Option<String>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            body: body.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pulse {
    Short,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HapticPattern {
    /// Work finished: three short pulses and one long.
    WorkComplete,
    /// Rest finished: two short pulses.
    RestComplete,
}

impl HapticPattern {
    /// `(offset from start, pulse)` pairs.
    pub fn pulses(self) -> &'static [(Duration, Pulse)] {
        const WORK_COMPLETE: &[(Duration, Pulse)] = &[
            (Duration::from_millis(0), Pulse::Short),
            (Duration::from_millis(500), Pulse::Short),
            (Duration::from_millis(1000), Pulse::Short),
            (Duration::from_millis(1800), Pulse::Long),
        ];
        const REST_COMPLETE: &[(Duration, Pulse)] = &[
            (Duration::from_millis(0), Pulse::Short),
            (Duration::from_millis(500), Pulse::Short),
        ];
        match self {
            HapticPattern::WorkComplete => WORK_COMPLETE,
            HapticPattern::RestComplete => REST_COMPLETE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    WorkComplete,
    RestComplete,
    NearExpiry,
}

impl Tone {
    /// Asset file stem.
    pub fn asset_name(self) -> &'static str {
        match self {
            Tone::WorkComplete => "work_complete",
            Tone::RestComplete => "rest_complete",
            Tone::NearExpiry => "alert",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Work,
    Rest,
}

impl Track {
    pub fn asset_name(self) -> &'static str {
        match self {
            Track::Work => "work_music",
            Track::Rest => "rest_music",
        }
    }
}

pub trait Notifier: Send {
    /// Asked once at startup. `PermissionDenied` silences notifications for
    /// the rest of the process.
    fn request_permission(&mut self) -> Result<(), EffectError> {
        Ok(())
    }

    fn schedule(&mut self, notification: &Notification) -> Result<(), EffectError>;
}

pub trait Haptics: Send {
    fn play_pattern(&mut self, pattern: HapticPattern) -> Result<(), EffectError>;
}

pub trait SoundPlayer: Send {
    fn play_tone(&mut self, tone: Tone) -> Result<(), EffectError>;
}

/// Looping background music. `play` with the track that is already playing
/// must be a no-op.
pub trait MusicPlayer: Send {
    fn play(&mut self, track: Track, looped: bool) -> Result<(), EffectError>;

    fn stop(&mut self) -> Result<(), EffectError>;

    fn set_volume(&mut self, volume: f32) -> Result<(), EffectError>;

    fn is_playing(&self) -> bool;

    fn current_track(&self) -> Option<Track>;
}

/// The full capability set handed to the state manager.
pub struct Effects {
    pub notifier: Box<dyn Notifier>,
    pub haptics: Box<dyn Haptics>,
    pub sound: Box<dyn SoundPlayer>,
    pub music: Box<dyn MusicPlayer>,
}

impl Effects {
    /// Every capability does nothing.
    pub fn silent() -> Self {
        Self {
            notifier: Box::new(Silent::default()),
            haptics: Box::new(Silent::default()),
            sound: Box::new(Silent::default()),
            music: Box::new(Silent::default()),
        }
    }
}

/// No-op collaborator for hosts lacking a capability. Tracks the music
/// track so `is_playing` stays truthful.
#[derive(Debug, Default)]
pub struct Silent {
    track: Option<Track>,
}

impl Notifier for Silent {
    fn schedule(&mut self, _notification: &Notification) -> Result<(), EffectError> {
        Ok(())
    }
}

impl Haptics for Silent {
    fn play_pattern(&mut self, _pattern: HapticPattern) -> Result<(), EffectError> {
        Ok(())
    }
}

impl SoundPlayer for Silent {
    fn play_tone(&mut self, _tone: Tone) -> Result<(), EffectError> {
        Ok(())
    }
}

impl MusicPlayer for Silent {
    fn play(&mut self, track: Track, _looped: bool) -> Result<(), EffectError> {
        self.track = Some(track);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EffectError> {
        self.track = None;
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) -> Result<(), EffectError> {
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.track.is_some()
    }

    fn current_track(&self) -> Option<Track> {
        self.track
    }
}

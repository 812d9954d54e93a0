//! User preferences and their persistence.
//!
//! [`SettingsStore`] maps [`Preferences`], the onboarding answers and the
//! work-time statistics onto a [`KeyValueStore`]. Loading never fails: an
//! absent key, an unreadable key and an unparsable value all fall back to the
//! documented default. Presence is checked explicitly, so a stored `false` or
//! a volume of `0.0` is kept as-is rather than replaced by the default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::kv::KeyValueStore;
use crate::error::{StoreError, ValidationError};
use crate::onboarding::{
    FitnessHabit, OnboardingProfile, RestFrequency, WorkType, DEFAULT_SITTING_HOURS,
};
use crate::phase::PhaseDurations;
use crate::statistics::Statistics;

/// Persisted key names.
pub mod keys {
    pub const WORK_MINUTES: &str = "workMinutes";
    pub const REST_MINUTES: &str = "restMinutes";
    pub const SOUND_ENABLED: &str = "soundEnabled";
    pub const VIBRATION_ENABLED: &str = "vibrationEnabled";
    pub const MUSIC_ENABLED: &str = "musicEnabled";
    pub const MUSIC_VOLUME: &str = "musicVolume";
    pub const DARK_MODE: &str = "darkMode";
    pub const WORK_TYPE: &str = "workType";
    pub const SITTING_HOURS: &str = "sittingHours";
    pub const REST_FREQUENCY: &str = "restFrequency";
    pub const FITNESS_HABIT: &str = "fitnessHabit";
    pub const TODAY_SECONDS: &str = "todaySeconds";
    pub const WEEK_SECONDS: &str = "weekSeconds";
    pub const ONBOARDING_COMPLETE: &str = "onboardingComplete";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DarkMode {
    #[default]
    System,
    On,
    Off,
}

impl DarkMode {
    /// Stored as 0 (system), 1 (on), 2 (off).
    pub fn as_index(self) -> u8 {
        match self {
            DarkMode::System => 0,
            DarkMode::On => 1,
            DarkMode::Off => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(DarkMode::System),
            1 => Some(DarkMode::On),
            2 => Some(DarkMode::Off),
            _ => None,
        }
    }
}

impl FromStr for DarkMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "system" => Ok(DarkMode::System),
            "on" => Ok(DarkMode::On),
            "off" => Ok(DarkMode::Off),
            other => Err(ValidationError::InvalidValue {
                field: "dark_mode".into(),
                message: format!("unknown option '{other}', expected system, on or off"),
            }),
        }
    }
}

impl fmt::Display for DarkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DarkMode::System => "system",
            DarkMode::On => "on",
            DarkMode::Off => "off",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub work_minutes: u32,
    pub rest_minutes: u32,
    pub sound_enabled: bool,
    pub vibration_enabled: bool,
    pub music_enabled: bool,
    /// 0.0 ..= 1.0
    pub music_volume: f32,
    pub dark_mode: DarkMode,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            work_minutes: 45,
            rest_minutes: 10,
            sound_enabled: true,
            vibration_enabled: true,
            music_enabled: true,
            music_volume: 0.5,
            dark_mode: DarkMode::System,
        }
    }
}

impl Preferences {
    pub fn durations(&self) -> PhaseDurations {
        PhaseDurations::from_minutes(self.work_minutes, self.rest_minutes)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.work_minutes == 0 {
            return Err(invalid("work_minutes", "must be greater than 0"));
        }
        if self.rest_minutes == 0 {
            return Err(invalid("rest_minutes", "must be greater than 0"));
        }
        if !valid_volume(self.music_volume) {
            return Err(invalid(
                "music_volume",
                &format!("{} is outside 0.0..=1.0", self.music_volume),
            ));
        }
        Ok(())
    }

    /// Set one field from its string form, e.g. `("music_volume", "0.3")`.
    /// The result is validated; on error `self` is unchanged.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        let mut next = *self;
        match field {
            "work_minutes" => next.work_minutes = parse_field(field, value)?,
            "rest_minutes" => next.rest_minutes = parse_field(field, value)?,
            "sound_enabled" => next.sound_enabled = parse_field(field, value)?,
            "vibration_enabled" => next.vibration_enabled = parse_field(field, value)?,
            "music_enabled" => next.music_enabled = parse_field(field, value)?,
            "music_volume" => next.music_volume = parse_field(field, value)?,
            "dark_mode" => next.dark_mode = value.parse()?,
            other => return Err(invalid(other, "unknown preference")),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Restore defaults for everything except the music volume.
    pub fn reset_to_defaults(&mut self) {
        *self = Self {
            music_volume: self.music_volume,
            ..Self::default()
        };
    }
}

fn valid_volume(volume: f32) -> bool {
    volume.is_finite() && (0.0..=1.0).contains(&volume)
}

fn invalid(field: &str, message: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn parse_field<T: FromStr>(field: &str, value: &str) -> Result<T, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(field, &format!("cannot parse '{value}'")))
}

/// Typed access to preferences, onboarding answers and statistics.
pub struct SettingsStore {
    store: Box<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Load preferences, filling every absent or unusable key with its default.
    pub fn load(&self) -> Preferences {
        let defaults = Preferences::default();
        Preferences {
            work_minutes: self
                .read::<u32>(keys::WORK_MINUTES)
                .filter(|m| *m > 0)
                .unwrap_or(defaults.work_minutes),
            rest_minutes: self
                .read::<u32>(keys::REST_MINUTES)
                .filter(|m| *m > 0)
                .unwrap_or(defaults.rest_minutes),
            sound_enabled: self
                .read(keys::SOUND_ENABLED)
                .unwrap_or(defaults.sound_enabled),
            vibration_enabled: self
                .read(keys::VIBRATION_ENABLED)
                .unwrap_or(defaults.vibration_enabled),
            music_enabled: self
                .read(keys::MUSIC_ENABLED)
                .unwrap_or(defaults.music_enabled),
            music_volume: self
                .read::<f32>(keys::MUSIC_VOLUME)
                .filter(|v| valid_volume(*v))
                .unwrap_or(defaults.music_volume),
            dark_mode: self
                .read::<u8>(keys::DARK_MODE)
                .and_then(DarkMode::from_index)
                .unwrap_or(defaults.dark_mode),
        }
    }

    /// Persist every preference in one batch.
    pub fn save(&mut self, prefs: &Preferences) -> Result<(), StoreError> {
        self.store.set_many(&preference_entries(prefs))
    }

    pub fn load_statistics(&self) -> Statistics {
        let read = |key| {
            self.read::<f64>(key)
                .filter(|s| s.is_finite() && *s >= 0.0)
                .unwrap_or(0.0)
        };
        Statistics {
            today_secs: read(keys::TODAY_SECONDS),
            week_secs: read(keys::WEEK_SECONDS),
        }
    }

    pub fn save_statistics(&mut self, stats: &Statistics) -> Result<(), StoreError> {
        self.store.set_many(&statistics_entries(stats))
    }

    /// The stored onboarding answers, if the questionnaire was ever saved.
    pub fn load_profile(&self) -> Option<OnboardingProfile> {
        let work_type = self.read::<String>(keys::WORK_TYPE)?;
        Some(OnboardingProfile {
            work_type: WorkType::from_key(&work_type),
            sitting_hours: self
                .read(keys::SITTING_HOURS)
                .unwrap_or(DEFAULT_SITTING_HOURS),
            rest_frequency: self
                .read(keys::REST_FREQUENCY)
                .unwrap_or(RestFrequency::Irregular),
            fitness_habit: self
                .read(keys::FITNESS_HABIT)
                .unwrap_or(FitnessHabit::Daily),
        })
    }

    pub fn save_profile(&mut self, profile: &OnboardingProfile) -> Result<(), StoreError> {
        self.store.set_many(&profile_entries(profile))
    }

    pub fn is_onboarding_complete(&self) -> bool {
        self.read(keys::ONBOARDING_COMPLETE).unwrap_or(false)
    }

    /// Persist the onboarding outcome and the completion flag together.
    pub fn complete_onboarding(
        &mut self,
        prefs: &Preferences,
        profile: Option<&OnboardingProfile>,
    ) -> Result<(), StoreError> {
        let mut entries = preference_entries(prefs);
        if let Some(profile) = profile {
            entries.extend(profile_entries(profile));
        }
        entries.push((keys::ONBOARDING_COMPLETE, true.to_string()));
        self.store.set_many(&entries)
    }

    /// Persist preferences and statistics in one batch.
    pub fn save_all(&mut self, prefs: &Preferences, stats: &Statistics) -> Result<(), StoreError> {
        let mut entries = preference_entries(prefs);
        entries.extend(statistics_entries(stats));
        self.store.set_many(&entries)
    }

    fn read<T: FromStr>(&self, key: &str) -> Option<T> {
        match self.store.get(key) {
            Ok(Some(raw)) => match raw.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(key, raw = %raw, "unparsable stored value, using default");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "read failed, using default");
                None
            }
        }
    }
}

fn preference_entries(prefs: &Preferences) -> Vec<(&'static str, String)> {
    vec![
        (keys::WORK_MINUTES, prefs.work_minutes.to_string()),
        (keys::REST_MINUTES, prefs.rest_minutes.to_string()),
        (keys::SOUND_ENABLED, prefs.sound_enabled.to_string()),
        (keys::VIBRATION_ENABLED, prefs.vibration_enabled.to_string()),
        (keys::MUSIC_ENABLED, prefs.music_enabled.to_string()),
        (keys::MUSIC_VOLUME, prefs.music_volume.to_string()),
        (keys::DARK_MODE, prefs.dark_mode.as_index().to_string()),
    ]
}

fn statistics_entries(stats: &Statistics) -> Vec<(&'static str, String)> {
    vec![
        (keys::TODAY_SECONDS, stats.today_secs.to_string()),
        (keys::WEEK_SECONDS, stats.week_secs.to_string()),
    ]
}

fn profile_entries(profile: &OnboardingProfile) -> Vec<(&'static str, String)> {
    vec![
        (keys::WORK_TYPE, profile.work_type.as_key().to_string()),
        (keys::SITTING_HOURS, profile.sitting_hours.to_string()),
        (keys::REST_FREQUENCY, profile.rest_frequency.as_key().to_string()),
        (keys::FITNESS_HABIT, profile.fitness_habit.as_key().to_string()),
    ]
}

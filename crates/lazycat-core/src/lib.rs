//! # LazyCat Core Library
//!
//! Core logic for LazyCat, a work/rest interval timer that nudges desk
//! workers to stand up and move. All behavior lives here; the `lazycat` CLI
//! (and any GUI) is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Phase state machine**: `Onboarding -> Working <-> Resting`, with
//!   `Paused` wrapping either active phase
//! - **Timer engine**: a wall-clock countdown that the caller ticks with clock
//!   readings; remaining time is recomputed from an anchor, never decremented
//! - **State manager**: the single owner of timer state, preferences and
//!   statistics, with an optional tokio actor ([`runtime`]) driving ticks
//! - **Side effects**: notifications, haptics, tones and music behind
//!   collaborator traits; failures are logged, never propagated into state
//! - **Storage**: a key-value store (SQLite or in-memory) for preferences and
//!   statistics, and a TOML file for process configuration
//!
//! ## Key Components
//!
//! - [`StateManager`]: commands, tick handler and settings mutators
//! - [`TimerEngine`]: countdown and phase transitions
//! - [`SettingsStore`]: typed preferences over a [`KeyValueStore`]
//! - [`SideEffectDispatcher`]: edge-triggered cues
//! - [`AppConfig`]: application configuration

pub mod effects;
pub mod error;
pub mod events;
pub mod format;
pub mod manager;
pub mod onboarding;
pub mod phase;
pub mod runtime;
pub mod statistics;
pub mod storage;
pub mod timer;

pub use effects::{Effects, SideEffectDispatcher};
pub use error::{ConfigError, CoreError, EffectError, StoreError, ValidationError};
pub use events::Event;
pub use manager::{ManagerOptions, StateManager, View};
pub use onboarding::{OnboardingProfile, Recommendation};
pub use phase::{BasePhase, Phase, PhaseDurations, Transition, TransitionCause};
pub use runtime::ManagerHandle;
pub use statistics::Statistics;
pub use storage::{
    AppConfig, DarkMode, KeyValueStore, MemoryStore, Preferences, SettingsStore, SqliteStore,
};
pub use timer::{Clock, ManualClock, SystemClock, TimerEngine, TimerState};

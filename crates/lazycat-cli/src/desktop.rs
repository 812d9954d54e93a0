//! Desktop implementations of the side-effect collaborators.
//!
//! Notifications go through notify-rust on a short-lived thread each. Tones
//! and music are played by an external command (`audio.player`, `paplay` by default) on files found in
//! `audio.asset_dir`. A terminal has no vibration motor, so haptic patterns
//! are only logged.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use lazycat_core::effects::{
    Effects, HapticPattern, Haptics, MusicPlayer, Notification, Notifier, SoundPlayer, Tone, Track,
};
use lazycat_core::{AppConfig, EffectError};

const AUDIO_EXTENSIONS: &[&str] = &["oga", "ogg", "wav", "mp3", "flac"];
const CHILD_POLL: Duration = Duration::from_millis(100);

pub fn effects(config: &AppConfig) -> Effects {
    let files = AudioFiles {
        dir: config.audio.asset_dir.as_ref().map(PathBuf::from),
        player: config.audio.player.clone(),
    };
    Effects {
        notifier: Box::new(DesktopNotifier::new(config.notifications.enabled)),
        haptics: Box::new(LogHaptics),
        sound: Box::new(TonePlayer {
            files: files.clone(),
        }),
        music: Box::new(CommandMusic::new(files)),
    }
}

// ── Notifications ────────────────────────────────────────────────────

type ShowFn = fn(&Notification) -> Result<(), String>;

/// Each notification is shown from its own thread; a slow or missing
/// notification daemon never holds up the caller.
struct DesktopNotifier {
    enabled: bool,
    show: ShowFn,
}

impl DesktopNotifier {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            show: show_desktop,
        }
    }
}

fn show_desktop(notification: &Notification) -> Result<(), String> {
    notify_rust::Notification::new()
        .summary(&notification.title)
        .body(&notification.body)
        .appname("lazycat")
        .icon("alarm-clock")
        .show()
        .map(drop)
        .map_err(|e| e.to_string())
}

impl Notifier for DesktopNotifier {
    fn request_permission(&mut self) -> Result<(), EffectError> {
        if self.enabled {
            Ok(())
        } else {
            Err(EffectError::PermissionDenied(
                "notifications.enabled is false".into(),
            ))
        }
    }

    fn schedule(&mut self, notification: &Notification) -> Result<(), EffectError> {
        let notification = notification.clone();
        let show = self.show;
        std::thread::Builder::new()
            .name("lazycat-notify".into())
            .spawn(move || {
                if let Err(e) = show(&notification) {
                    tracing::warn!(id = %notification.id, error = %e, "desktop notification failed");
                }
            })
            .map(drop)
            .map_err(|e| EffectError::Failed(e.to_string()))
    }
}

// ── Haptics ──────────────────────────────────────────────────────────

struct LogHaptics;

impl Haptics for LogHaptics {
    fn play_pattern(&mut self, pattern: HapticPattern) -> Result<(), EffectError> {
        tracing::debug!(?pattern, pulses = pattern.pulses().len(), "haptic pattern");
        Ok(())
    }
}

// ── Audio files ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct AudioFiles {
    dir: Option<PathBuf>,
    player: String,
}

impl AudioFiles {
    /// First `<dir>/<stem>.<ext>` that exists.
    fn resolve(&self, stem: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        AUDIO_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{stem}.{ext}")))
            .find(|path| path.exists())
    }

    fn command(&self, path: &Path, volume: Option<f32>) -> Command {
        let mut cmd = Command::new(&self.player);
        if let Some(volume) = volume {
            // paplay takes 0..=65536; other players get the file only.
            if self.player.ends_with("paplay") {
                cmd.arg(format!("--volume={}", (volume.clamp(0.0, 1.0) * 65536.0) as u32));
            }
        }
        cmd.arg(path).stdout(Stdio::null()).stderr(Stdio::null());
        cmd
    }
}

// ── Tones ────────────────────────────────────────────────────────────

/// Plays tone files; without an asset directory it rings the terminal bell.
struct TonePlayer {
    files: AudioFiles,
}

impl SoundPlayer for TonePlayer {
    fn play_tone(&mut self, tone: Tone) -> Result<(), EffectError> {
        if self.files.dir.is_none() {
            let mut stderr = std::io::stderr();
            return stderr
                .write_all(b"\x07")
                .and_then(|()| stderr.flush())
                .map_err(|e| EffectError::Failed(e.to_string()));
        }
        let path = self
            .files
            .resolve(tone.asset_name())
            .ok_or_else(|| EffectError::ResourceMissing(tone.asset_name().into()))?;
        let mut child = self
            .files
            .command(&path, None)
            .spawn()
            .map_err(|e| EffectError::Failed(format!("{}: {e}", self.files.player)))?;
        std::thread::Builder::new()
            .name("lazycat-tone".into())
            .spawn(move || {
                if let Err(e) = child.wait() {
                    tracing::warn!(?tone, error = %e, "tone player was not reaped");
                }
            })
            .map(drop)
            .map_err(|e| EffectError::Failed(e.to_string()))
    }
}

// ── Music ────────────────────────────────────────────────────────────

struct Playback {
    track: Track,
    looped: bool,
    stop: Arc<AtomicBool>,
    worker: JoinHandle<()>,
}

/// Background music through the player command. A worker thread owns the
/// child process and respawns it when `looped` is set.
struct CommandMusic {
    files: AudioFiles,
    volume: f32,
    playback: Option<Playback>,
}

impl CommandMusic {
    fn new(files: AudioFiles) -> Self {
        Self {
            files,
            volume: 0.5,
            playback: None,
        }
    }
}

impl MusicPlayer for CommandMusic {
    fn play(&mut self, track: Track, looped: bool) -> Result<(), EffectError> {
        if self.current_track() == Some(track) {
            return Ok(());
        }
        self.stop()?;

        let path = self
            .files
            .resolve(track.asset_name())
            .ok_or_else(|| EffectError::ResourceMissing(track.asset_name().into()))?;
        let files = self.files.clone();
        let volume = self.volume;
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let worker = std::thread::Builder::new()
            .name(format!("lazycat-music-{}", track.asset_name()))
            .spawn(move || play_loop(&files, &path, volume, looped, &worker_stop))
            .map_err(|e| EffectError::Failed(e.to_string()))?;

        tracing::debug!(?track, looped, "music started");
        self.playback = Some(Playback {
            track,
            looped,
            stop,
            worker,
        });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EffectError> {
        if let Some(playback) = self.playback.take() {
            playback.stop.store(true, Ordering::SeqCst);
            tracing::debug!(track = ?playback.track, "music stopped");
        }
        Ok(())
    }

    /// The player takes its volume at launch, so a running track is
    /// restarted at the new level.
    fn set_volume(&mut self, volume: f32) -> Result<(), EffectError> {
        let volume = volume.clamp(0.0, 1.0);
        if volume == self.volume {
            return Ok(());
        }
        self.volume = volume;
        let running = self
            .playback
            .as_ref()
            .filter(|p| !p.worker.is_finished())
            .map(|p| (p.track, p.looped));
        if let Some((track, looped)) = running {
            self.stop()?;
            self.play(track, looped)?;
        }
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.worker.is_finished())
    }

    fn current_track(&self) -> Option<Track> {
        self.playback
            .as_ref()
            .filter(|p| !p.worker.is_finished())
            .map(|p| p.track)
    }
}

impl Drop for CommandMusic {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn play_loop(files: &AudioFiles, path: &Path, volume: f32, looped: bool, stop: &AtomicBool) {
    loop {
        let mut child = match files.command(path, Some(volume)).spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(player = %files.player, error = %e, "music player failed to start");
                return;
            }
        };
        loop {
            if stop.load(Ordering::SeqCst) {
                let _ = child.kill();
                let _ = child.wait();
                return;
            }
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) => std::thread::sleep(CHILD_POLL),
                Err(e) => {
                    tracing::warn!(error = %e, "lost track of music player");
                    return;
                }
            }
        }
        if !looped || stop.load(Ordering::SeqCst) {
            return;
        }
    }
}

//! Background tick loop for a [`StateManager`].
//!
//! [`spawn`] moves the manager into a tokio task. Commands arrive over an mpsc
//! channel with oneshot replies and are interleaved with ticks by
//! `tokio::select!`, so a tick never observes a half-applied command. The
//! interval is only polled while the countdown runs.
//!
//! ```ignore
//! let handle = runtime::spawn(manager, config.timer.tick_interval());
//! handle.start().await?;
//! let view = handle.snapshot().await?;
//! handle.shutdown().await?;
//! ```

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::manager::{StateManager, View};
use crate::onboarding::OnboardingProfile;
use crate::storage::Preferences;

const COMMAND_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 64;

type Reply<T> = oneshot::Sender<T>;

enum Command {
    Start(Reply<Option<Event>>),
    Pause(Reply<Vec<Event>>),
    Resume(Reply<Option<Event>>),
    Reset(Reply<Vec<Event>>),
    Skip(Reply<Vec<Event>>),
    CompleteOnboarding(Option<OnboardingProfile>, Reply<Result<Option<Event>>>),
    UpdatePreferences(Preferences, Reply<Result<()>>),
    SetPreference {
        field: String,
        value: String,
        reply: Reply<Result<()>>,
    },
    ResetPreferences(Reply<Result<()>>),
    ResetToday(Reply<Result<()>>),
    ResetWeek(Reply<Result<()>>),
    Flush(Reply<Result<()>>),
    Snapshot(Reply<View>),
    Shutdown(Reply<Result<()>>),
}

/// Cloneable handle to a running manager task.
///
/// Every method fails with [`CoreError::RuntimeStopped`] once the task has
/// shut down.
#[derive(Clone)]
pub struct ManagerHandle {
    tx: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
}

/// Move `manager` into a new tokio task ticking every `tick_interval`.
pub fn spawn(manager: StateManager, tick_interval: Duration) -> ManagerHandle {
    let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    tokio::spawn(run(manager, tick_interval, rx, events.clone()));
    ManagerHandle { tx, events }
}

impl ManagerHandle {
    /// Events produced by commands and ticks from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub async fn start(&self) -> Result<Option<Event>> {
        self.request(Command::Start).await
    }

    pub async fn pause(&self) -> Result<Vec<Event>> {
        self.request(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<Option<Event>> {
        self.request(Command::Resume).await
    }

    pub async fn reset(&self) -> Result<Vec<Event>> {
        self.request(Command::Reset).await
    }

    pub async fn skip(&self) -> Result<Vec<Event>> {
        self.request(Command::Skip).await
    }

    pub async fn complete_onboarding(
        &self,
        profile: Option<OnboardingProfile>,
    ) -> Result<Option<Event>> {
        self.request(|reply| Command::CompleteOnboarding(profile, reply))
            .await?
    }

    pub async fn update_preferences(&self, preferences: Preferences) -> Result<()> {
        self.request(|reply| Command::UpdatePreferences(preferences, reply))
            .await?
    }

    pub async fn set_preference(&self, field: &str, value: &str) -> Result<()> {
        let (field, value) = (field.to_string(), value.to_string());
        self.request(|reply| Command::SetPreference {
            field,
            value,
            reply,
        })
        .await?
    }

    pub async fn reset_preferences(&self) -> Result<()> {
        self.request(Command::ResetPreferences).await?
    }

    pub async fn reset_today(&self) -> Result<()> {
        self.request(Command::ResetToday).await?
    }

    pub async fn reset_week(&self) -> Result<()> {
        self.request(Command::ResetWeek).await?
    }

    pub async fn flush(&self) -> Result<()> {
        self.request(Command::Flush).await?
    }

    pub async fn snapshot(&self) -> Result<View> {
        self.request(Command::Snapshot).await
    }

    /// Persist everything, stop music and end the task.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(Command::Shutdown).await?
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| CoreError::RuntimeStopped)?;
        rx.await.map_err(|_| CoreError::RuntimeStopped)
    }
}

async fn run(
    mut manager: StateManager,
    tick_interval: Duration,
    mut rx: mpsc::Receiver<Command>,
    events: broadcast::Sender<Event>,
) {
    let mut ticker = time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::debug!(?tick_interval, "state manager task started");

    loop {
        let running = manager.is_running();
        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else {
                    // Every handle is gone.
                    if let Err(e) = manager.shutdown() {
                        tracing::warn!(error = %e, "shutdown after last handle dropped failed");
                    }
                    break;
                };
                if handle(&mut manager, command, &events).is_break() {
                    break;
                }
            }
            _ = ticker.tick(), if running => {
                publish(&events, &manager.tick());
            }
        }
    }
    tracing::debug!("state manager task finished");
}

fn handle(
    manager: &mut StateManager,
    command: Command,
    events: &broadcast::Sender<Event>,
) -> ControlFlow<()> {
    match command {
        Command::Start(reply) => {
            let event = manager.start();
            publish(events, event.as_slice());
            let _ = reply.send(event);
        }
        Command::Pause(reply) => {
            let batch = manager.pause();
            publish(events, &batch);
            let _ = reply.send(batch);
        }
        Command::Resume(reply) => {
            let event = manager.resume();
            publish(events, event.as_slice());
            let _ = reply.send(event);
        }
        Command::Reset(reply) => {
            let batch = manager.reset();
            publish(events, &batch);
            let _ = reply.send(batch);
        }
        Command::Skip(reply) => {
            let batch = manager.skip();
            publish(events, &batch);
            let _ = reply.send(batch);
        }
        Command::CompleteOnboarding(profile, reply) => {
            let result = manager.complete_onboarding(profile);
            match &result {
                Ok(Some(event)) => publish(events, std::slice::from_ref(event)),
                Err(CoreError::Unsaved { event, .. }) => {
                    publish(events, std::slice::from_ref(event.as_ref()))
                }
                _ => {}
            }
            let _ = reply.send(result);
        }
        Command::UpdatePreferences(preferences, reply) => {
            let _ = reply.send(manager.update_preferences(preferences));
        }
        Command::SetPreference {
            field,
            value,
            reply,
        } => {
            let _ = reply.send(manager.set_preference(&field, &value));
        }
        Command::ResetPreferences(reply) => {
            let _ = reply.send(manager.reset_preferences());
        }
        Command::ResetToday(reply) => {
            let _ = reply.send(manager.reset_today());
        }
        Command::ResetWeek(reply) => {
            let _ = reply.send(manager.reset_week());
        }
        Command::Flush(reply) => {
            let _ = reply.send(manager.flush());
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(manager.view());
        }
        Command::Shutdown(reply) => {
            let _ = reply.send(manager.shutdown());
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

fn publish(events: &broadcast::Sender<Event>, batch: &[Event]) {
    for event in batch {
        // No subscribers is fine.
        let _ = events.send(event.clone());
    }
}

//! Foreground timer loop.

use std::io::Write;
use std::time::Duration;

use clap::Args;
use lazycat_core::runtime::{self, ManagerHandle};
use lazycat_core::{AppConfig, CoreError, Event, ManagerOptions, Phase, StateManager, SystemClock, View};
use tokio::sync::broadcast::error::RecvError;

use crate::{desktop, session};

#[derive(Args)]
pub struct RunArgs {
    /// Print every event as a JSON line instead of a live clock
    #[arg(long)]
    json: bool,
    /// Do not start the countdown automatically
    #[arg(long)]
    no_start: bool,
}

pub fn run(args: RunArgs, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_loop(args, config))
}

async fn run_loop(args: RunArgs, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let manager = StateManager::new(
        session::open_settings_or_memory(),
        desktop::effects(config),
        SystemClock::new(),
        ManagerOptions::from(config),
    );
    let handle = runtime::spawn(manager, config.timer.tick_interval());
    let mut events = handle.subscribe();

    if handle.snapshot().await?.phase == Phase::Onboarding {
        eprintln!("first run: using default durations (see `lazycat onboard` to tailor them)");
        match handle.complete_onboarding(None).await {
            Ok(_) => {}
            Err(CoreError::Unsaved { source, .. }) => {
                tracing::warn!(error = %source, "onboarding applied but not saved");
            }
            Err(e) => return Err(e.into()),
        }
    }
    if !args.no_start {
        handle.start().await?;
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut display = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("received Ctrl+C, shutting down");
                break;
            }
            _ = display.tick(), if !args.json => {
                render_clock(&handle.snapshot().await?)?;
            }
            event = events.recv() => match event {
                Ok(event) => print_event(&event, args.json)?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event output fell behind");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    shutdown(&handle).await?;
    if !args.json {
        println!();
    }
    Ok(())
}

async fn shutdown(handle: &ManagerHandle) -> Result<(), Box<dyn std::error::Error>> {
    let stats = handle.snapshot().await?.statistics;
    handle.shutdown().await?;
    tracing::info!(today_secs = stats.today_secs, "session saved");
    Ok(())
}

fn render_clock(view: &View) -> std::io::Result<()> {
    let mut out = std::io::stdout();
    let skip = if view.can_skip { "  [skip allowed]" } else { "" };
    write!(
        out,
        "\r{:<14} {}  today {}{:<18}",
        view.status, view.clock, view.today, skip
    )?;
    out.flush()
}

fn print_event(event: &Event, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    if let Event::PhaseChanged { from, to, .. } = event {
        println!("\r{} -> {}", from.as_str(), to.as_str());
    }
    Ok(())
}

use std::fs::File;
use std::io::{self, stdout};
use std::panic;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, prelude::*};
use tokio::sync::{Notify, watch};
use tracing::{error, info};
use tracing_subscriber::prelude::*;

mod api;
mod simulation;
mod ui;

use simulation::{SharedObserver, SimulationConfig, SimulationWorld};
use ui::ControlState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = SimulationConfig::from_env()?;
    match config.headless_days {
        Some(days) => {
            init_tracing(None)?;
            run_headless(config, days).await
        }
        None => {
            // The terminal belongs to the TUI; logs go to the file without color codes.
            colored::control::set_override(false);
            init_tracing(Some(&config.log_file))?;
            run_tui(config).await
        }
    }
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
    Ok(())
}

fn spawn_api(
    config: &SimulationConfig,
    observer: &SharedObserver,
    shutdown: &Arc<Notify>,
) -> Option<tokio::task::JoinHandle<()>> {
    let addr = config.api_addr?;
    let observer = observer.clone();
    let shutdown = shutdown.clone();
    Some(tokio::spawn(async move {
        if let Err(err) = api::serve(addr, observer, shutdown).await {
            error!("{err:#}");
        }
    }))
}

async fn run_headless(config: SimulationConfig, days: u64) -> anyhow::Result<()> {
    let observer = SharedObserver::default();
    let shutdown_notify = Arc::new(Notify::new());
    let api_task = spawn_api(&config, &observer, &shutdown_notify);

    let mut simulation = SimulationWorld::from_config(config, observer.clone())?;
    for _ in 0..days {
        simulation.tick();
    }

    let summary = serde_json::to_string_pretty(&simulation.ledger().latest)?;
    info!(day = simulation.day(), "headless run finished\n{summary}");

    if let Some(api_task) = api_task {
        info!("serving the final snapshot until ctrl-c");
        let _ = tokio::signal::ctrl_c().await;
        shutdown_notify.notify_waiters();
        api_task.await?;
    }
    Ok(())
}

async fn run_tui(config: SimulationConfig) -> anyhow::Result<()> {
    let initial_tick_duration = config.tick_duration();
    let api_addr = config.api_addr.map(|addr| addr.to_string());

    let (tick_duration_tx, mut tick_duration_rx) = watch::channel(initial_tick_duration);
    let (pause_tx, mut pause_rx) = watch::channel(false);

    let observer = SharedObserver::default();
    let shutdown_notify = Arc::new(Notify::new());
    let api_task = spawn_api(&config, &observer, &shutdown_notify);

    let mut simulation = SimulationWorld::from_config(config, observer.clone())?;
    let notify_for_simulation = shutdown_notify.clone();
    let simulation_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(*tick_duration_rx.borrow());
        let mut paused = *pause_rx.borrow();
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if !paused {
                        simulation.tick();
                    }
                },
                result = tick_duration_rx.changed() => {
                    if result.is_ok() {
                        let new_duration = *tick_duration_rx.borrow();
                        interval = tokio::time::interval(new_duration);
                    } else {
                        break;
                    }
                },
                result = pause_rx.changed() => {
                    if result.is_ok() {
                        paused = *pause_rx.borrow();
                    } else {
                        break;
                    }
                },
                _ = notify_for_simulation.notified() => break,
            }
        }
    });
    let ctrlc_notify = shutdown_notify.clone();
    let ctrl_c_task = tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        ctrlc_notify.notify_waiters();
    });

    let mut terminal = init_terminal()?;
    let mut term_guard = TerminalGuard::new();
    panic::set_hook(Box::new(|info| {
        let _ = restore_terminal();
        eprintln!("panic: {info}");
    }));
    let mut app_should_run = true;

    while app_should_run {
        let control_state = ControlState {
            paused: *pause_tx.borrow(),
            tick_duration: *tick_duration_tx.borrow(),
            api_addr: api_addr.clone(),
        };
        let snapshot = observer
            .read()
            .map_err(|_| anyhow::anyhow!("observer lock is poisoned"))?
            .clone();

        terminal.draw(|frame| ui::render(frame, &snapshot, &control_state))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app_should_run = false,
                    KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => {
                        let new_state = !*pause_tx.borrow();
                        pause_tx.send(new_state).ok();
                    }
                    KeyCode::Char('+') | KeyCode::Char('=') => {
                        let current_duration = *tick_duration_tx.borrow();
                        let new_duration = (current_duration / 2).max(Duration::from_millis(1));
                        tick_duration_tx.send(new_duration).ok();
                    }
                    KeyCode::Char('-') => {
                        let current_duration = *tick_duration_tx.borrow();
                        let new_duration = (current_duration * 2).min(Duration::from_secs(60));
                        tick_duration_tx.send(new_duration).ok();
                    }
                    KeyCode::Char('r') | KeyCode::Char('R') => {
                        tick_duration_tx.send(initial_tick_duration).ok();
                        pause_tx.send(false).ok();
                    }
                    _ => {}
                }
            }
        }

        if ctrl_c_task.is_finished() {
            app_should_run = false;
        }
    }

    shutdown_notify.notify_waiters();
    // Closing the channels stops the simulation even if it was mid-tick.
    drop(tick_duration_tx);
    drop(pause_tx);
    simulation_task.await?;
    if let Some(api_task) = api_task {
        api_task.await?;
    }
    ctrl_c_task.abort();
    restore_terminal()?;
    term_guard.disarm();

    Ok(())
}

fn init_terminal() -> io::Result<Terminal<impl Backend>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Ensures terminal is restored on panic/early-return.
struct TerminalGuard {
    armed: bool,
}

impl TerminalGuard {
    fn new() -> Self {
        Self { armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = restore_terminal();
        }
    }
}

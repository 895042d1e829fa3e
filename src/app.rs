use crate::{
    config::AppConfig,
    effects::{
        Effects,
        TracingEffects,
    },
    reveal::RevealEvents,
    session::Session,
    storage::{
        FileStore,
        KeyValueStore,
    },
    ui,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    path::Path,
    time::Duration,
};
use tokio::time::{
    self,
    Instant,
    MissedTickBehavior,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// How often the rolling digits advance while a roll is running.
pub const ROLL_FRAME_INTERVAL: Duration = Duration::from_millis(60);
pub const LOG_ENV: &str = "BINGO_LOG";
const LOG_FILE_PREFIX: &str = "family-bingo.log";

/// Logs go to a daily file; the terminal belongs to the UI. Keep the guard
/// alive until exit so buffered lines are flushed.
pub fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .wrap_err_with(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!("Failed to install tracing subscriber: {e}"))?;
    Ok(guard)
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let store = FileStore::open(&config.state_dir)?;
    tracing::info!(state_dir = %store.path().display(), "opening saved game");
    let (mut session, mut reveal_events) =
        Session::open(store, TracingEffects::default(), config.session_options());
    session.resume_pending_reveal();

    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    tracing::info!("Starting UI");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(
        &mut session,
        &mut reveal_events,
        &mut ui_state,
        &mut input_events,
    )
    .await;
    session.shutdown();
    ui::terminal_exit()?;
    res
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Applies one interpreted key press to the session.
pub fn apply_user_event<S, E>(session: &mut Session<S, E>, event: ui::UserEvent) -> Flow
where
    S: KeyValueStore,
    E: Effects,
{
    match event {
        ui::UserEvent::Quit => return Flow::Quit,
        ui::UserEvent::StartOrStop => {
            session.start_or_stop();
        }
        ui::UserEvent::ToggleClimax => {
            session.toggle_manual_climax();
        }
        ui::UserEvent::ConfirmReset => session.reset(),
        ui::UserEvent::SetClimaxTrigger(value) => {
            session.set_climax_trigger(value);
        }
        ui::UserEvent::ToggleGrid
        | ui::UserEvent::OpenSettings
        | ui::UserEvent::OpenReset
        | ui::UserEvent::Redraw => {}
    }
    Flow::Continue
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn run_loop<S, E>(
    session: &mut Session<S, E>,
    reveal_events: &mut RevealEvents,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()>
where
    S: KeyValueStore,
    E: Effects,
{
    tracing::info!("Running app loop");
    let mut frames = time::interval(ROLL_FRAME_INTERVAL);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ui::draw(ui_state, &session.view()).wrap_err("initial draw failed")?;

    loop {
        let deadline = session.auto_stop_deadline();
        let rolling = session.is_rolling();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = frames.tick(), if rolling => {
                session.advance_rolling_display();
            }
            _ = wait_until(deadline) => {
                tracing::debug!("auto-stopping roll");
                session.stop_and_draw();
            }
            Some(event) = reveal_events.recv() => {
                session.handle_reveal_event(event);
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, event) else {
                    continue;
                };
                if apply_user_event(session, ev) == Flow::Quit {
                    break;
                }
            }
        }
        ui::draw(ui_state, &session.view()).wrap_err("draw failed")?;
    }
    Ok(())
}

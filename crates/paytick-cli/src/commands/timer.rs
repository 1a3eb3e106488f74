use std::time::Duration;

use chrono::Utc;
use clap::Subcommand;
use paytick_core::display::{format_currency, format_hms};
use paytick_core::TimerPhase;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the timer, or continue it after a pause
    Start,
    /// Pause the running timer
    Pause,
    /// Resume a paused timer
    Resume,
    /// Reset to idle state
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Resync after the machine was suspended
    Wake,
    /// Keep polling and print a status line every tick
    Watch {
        /// Print a single status line and exit
        #[arg(long)]
        once: bool,
    },
}

pub async fn run(action: TimerAction, quiet: bool) -> CliResult {
    let mut session = Session::open(quiet)?;
    session.catch_up()?;

    match action {
        TimerAction::Start => {
            let event = session.manager.engine_mut().start();
            session.print_outcome(event)?;
        }
        TimerAction::Pause => {
            let event = session.manager.engine_mut().pause();
            session.print_outcome(event)?;
        }
        TimerAction::Resume => {
            let event = session.manager.engine_mut().resume();
            session.print_outcome(event)?;
        }
        TimerAction::Reset => {
            let event = session.manager.engine_mut().reset();
            session.print_outcome(event)?;
        }
        TimerAction::Status => {
            if let Some(event) = session.manager.engine_mut().check_end() {
                print_json(&event)?;
            }
            print_json(&session.manager.engine().snapshot())?;
        }
        TimerAction::Wake => {
            for event in session.manager.engine_mut().on_wake() {
                print_json(&event)?;
            }
            print_json(&session.manager.engine().snapshot())?;
        }
        TimerAction::Watch { once } => watch(&mut session, once).await?,
    }
    Ok(())
}

/// Drive the engine from a tokio interval until Ctrl+C or completion.
///
/// A wall-clock gap of more than two ticks between iterations is treated
/// as a wake from suspension.
async fn watch(session: &mut Session, once: bool) -> CliResult {
    let tick_chrono = session.config.engine.tick_interval();
    let tick_ms = tick_chrono.num_milliseconds();
    let tick = tick_chrono.to_std().unwrap_or(Duration::from_secs(1));
    let wake_gap = tick_chrono * 2;

    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(tick_ms, "watching timer");
    let mut last = Utc::now();
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {
                debug!("interrupted");
                break;
            }
        }

        let now = Utc::now();
        let engine = session.manager.engine_mut();
        let events = if now - last > wake_gap {
            debug!(gap_ms = (now - last).num_milliseconds(), "tick gap, treating as wake");
            engine.on_wake()
        } else {
            engine.poll()
        };
        last = now;

        for event in &events {
            print_json(event)?;
        }
        println!("{}", status_line(session));

        if once || session.manager.engine().phase() == TimerPhase::Completed {
            break;
        }
    }
    Ok(())
}

fn status_line(session: &Session) -> String {
    let engine = session.manager.engine();
    let display = &session.config.display;
    let state = engine.state();
    format!(
        "{:<9} {}  {}  {:>5.1}%  [{}]",
        format!("{:?}", engine.phase()).to_lowercase(),
        format_hms(state.elapsed_secs),
        format_currency(state.earned, &display.currency_symbol, display.decimals),
        state.progress_pct(engine.settings()),
        engine.namespace(),
    )
}

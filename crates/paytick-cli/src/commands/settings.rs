use clap::Subcommand;
use paytick_core::{ClockTime, TimerSettings};
use serde_json::json;

use super::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the settings of the active mode
    Show,
    /// Save new settings; starts or updates the timer
    Apply {
        /// Hourly rate (defaults to the current rate)
        #[arg(long)]
        rate: Option<f64>,
        /// Work duration in hours (defaults to the current duration)
        #[arg(long)]
        duration: Option<f64>,
        /// Start time of day, HH:MM
        #[arg(long, conflicts_with = "clear_start")]
        start: Option<ClockTime>,
        /// Remove the configured start time
        #[arg(long)]
        clear_start: bool,
    },
}

pub fn run(action: SettingsAction, quiet: bool) -> CliResult {
    let mut session = Session::open(quiet)?;
    session.catch_up()?;

    match action {
        SettingsAction::Show => {
            let engine = session.manager.engine();
            print_json(&json!({
                "namespace": engine.namespace(),
                "settings": engine.settings(),
            }))?;
        }
        SettingsAction::Apply {
            rate,
            duration,
            start,
            clear_start,
        } => {
            let current = *session.manager.engine().settings();
            let start_time = match (start, clear_start) {
                (Some(t), _) => Some(t),
                (None, true) => None,
                (None, false) => current.start_time(),
            };
            let settings = TimerSettings::new(
                rate.unwrap_or(current.hourly_rate()),
                start_time,
                duration.unwrap_or(current.duration_hours()),
            )?;
            let event = session.manager.engine_mut().apply_settings(settings)?;
            session.print_outcome(event)?;
        }
    }
    Ok(())
}

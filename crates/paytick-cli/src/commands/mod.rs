pub mod config;
pub mod data;
pub mod mode;
pub mod settings;
pub mod timer;

use paytick_core::{
    Config, Event, LogNotifier, ModeManager, Notifier, NullNotifier, Severity, SqliteStore,
    SystemClock,
};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub type Manager = ModeManager<SqliteStore, SystemClock>;

/// Writes engine notices to stderr so stdout stays machine-readable.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn on_notify(&mut self, message: &str, severity: Severity) {
        let tag = match severity {
            Severity::Info => "info",
            Severity::Success => "ok",
            Severity::Warning => "warn",
        };
        eprintln!("[{tag}] {message}");
    }
}

/// Everything a command needs: loaded config and the hydrated engine.
pub struct Session {
    pub config: Config,
    pub manager: Manager,
}

impl Session {
    pub fn open(quiet: bool) -> paytick_core::error::Result<Self> {
        let config = Config::load_or_default();
        let store = SqliteStore::open()?;
        // Disabled notices still reach the log at --verbose.
        let notifier: Box<dyn Notifier> = match (quiet, config.notifications.enabled) {
            (true, _) => Box::new(NullNotifier),
            (false, true) => Box::new(StderrNotifier),
            (false, false) => Box::new(LogNotifier),
        };
        let manager = ModeManager::open(store, SystemClock, config.engine.clone(), notifier);
        tracing::debug!(mode = %manager.active(), phase = ?manager.engine().phase(), "session opened");
        Ok(Self { config, manager })
    }

    /// Print whatever the engine caught up on while nobody was polling.
    pub fn catch_up(&mut self) -> CliResult {
        for event in self.manager.engine_mut().poll() {
            print_json(&event)?;
        }
        Ok(())
    }

    /// Print `event`, or a snapshot when the command changed nothing.
    pub fn print_outcome(&self, event: Option<Event>) -> CliResult {
        match event {
            Some(event) => print_json(&event),
            None => print_json(&self.manager.engine().snapshot()),
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

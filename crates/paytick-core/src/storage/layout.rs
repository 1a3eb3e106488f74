//! Mapping of settings and timer state onto flat store keys.
//!
//! Every namespace holds the same key names; the alternate namespace
//! prefixes them (see [`Namespace::key`]). Values are stringified
//! primitives, instants are epoch milliseconds, and an absent instant is an
//! absent key.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::{KvStore, Namespace};
use crate::error::StoreError;
use crate::timer::{ClockTime, TimerSettings, TimerState, MAX_DURATION_HOURS};

pub const HOURLY_RATE: &str = "hourlyRate";
pub const START_TIME: &str = "startTime";
pub const DURATION: &str = "duration";
pub const EARNINGS: &str = "earnings";
pub const IS_RUNNING: &str = "isRunning";
pub const ELAPSED: &str = "elapsed";
pub const MANUALLY_PAUSED: &str = "manuallyPaused";
pub const END_TIME: &str = "endTime";
pub const START_TIMESTAMP: &str = "startTimestamp";

/// Unprefixed key holding the active namespace.
pub const ACTIVE_MODE: &str = "activeMode";

pub const SETTINGS_KEYS: [&str; 3] = [HOURLY_RATE, START_TIME, DURATION];
pub const STATE_KEYS: [&str; 6] = [
    EARNINGS,
    IS_RUNNING,
    ELAPSED,
    MANUALLY_PAUSED,
    END_TIME,
    START_TIMESTAMP,
];

/// Typed, namespaced view over a [`KvStore`].
#[derive(Debug, Clone, Default)]
pub struct StateStore<S> {
    backend: S,
}

impl<S: KvStore> StateStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    pub fn into_inner(self) -> S {
        self.backend
    }

    /// Load settings, falling back to defaults field by field when a value
    /// is missing or invalid.
    pub fn load_settings(&self, ns: Namespace) -> Result<TimerSettings, StoreError> {
        let defaults = TimerSettings::default();

        let rate = self
            .read_parsed::<f64>(ns, HOURLY_RATE)?
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(defaults.hourly_rate());
        let duration = self
            .read_parsed::<f64>(ns, DURATION)?
            .filter(|d| d.is_finite() && *d > 0.0 && *d <= MAX_DURATION_HOURS)
            .unwrap_or(defaults.duration_hours());
        let start_time = match self.backend.get(&ns.key(START_TIME))? {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => match raw.parse::<ClockTime>() {
                Ok(t) => Some(t),
                Err(e) => {
                    warn!(namespace = %ns, error = %e, "ignoring stored start time");
                    None
                }
            },
            None => None,
        };

        // Rate and duration were filtered above, so this cannot fail.
        Ok(TimerSettings::new(rate, start_time, duration).unwrap_or(defaults))
    }

    pub fn load_state(&self, ns: Namespace) -> Result<TimerState, StoreError> {
        let elapsed = self
            .read_parsed::<f64>(ns, ELAPSED)?
            .filter(|e| e.is_finite())
            .unwrap_or(0.0)
            .max(0.0);
        let earned = self
            .read_parsed::<f64>(ns, EARNINGS)?
            .filter(|e| e.is_finite())
            .unwrap_or(0.0)
            .max(0.0);

        Ok(TimerState {
            running: self.read_bool(ns, IS_RUNNING)?,
            manually_paused: self.read_bool(ns, MANUALLY_PAUSED)?,
            start_instant: self.read_instant(ns, START_TIMESTAMP)?,
            end_instant: self.read_instant(ns, END_TIME)?,
            elapsed_secs: elapsed,
            earned,
        })
    }

    /// Write settings and state for one transition as a single batch.
    pub fn persist(
        &mut self,
        ns: Namespace,
        state: &TimerState,
        settings: &TimerSettings,
    ) -> Result<(), StoreError> {
        let mut batch = settings_entries(ns, settings);
        batch.extend(state_entries(ns, state));
        self.backend.write_batch(&batch)
    }

    /// Remove timer-state keys of `ns`, keeping its settings.
    pub fn clear_state(&mut self, ns: Namespace) -> Result<(), StoreError> {
        let batch: Vec<_> = STATE_KEYS.iter().map(|k| (ns.key(k), None)).collect();
        self.backend.write_batch(&batch)
    }

    /// Remove every settings and timer-state key of `ns`.
    pub fn clear_all(&mut self, ns: Namespace) -> Result<(), StoreError> {
        let batch: Vec<_> = SETTINGS_KEYS
            .iter()
            .chain(STATE_KEYS.iter())
            .map(|k| (ns.key(k), None))
            .collect();
        self.backend.write_batch(&batch)
    }

    pub fn load_active(&self) -> Result<Option<Namespace>, StoreError> {
        Ok(self
            .backend
            .get(ACTIVE_MODE)?
            .and_then(|raw| match raw.parse() {
                Ok(ns) => Some(ns),
                Err(e) => {
                    warn!(error = %e, "ignoring stored active mode");
                    None
                }
            }))
    }

    pub fn save_active(&mut self, ns: Namespace) -> Result<(), StoreError> {
        self.backend.set(ACTIVE_MODE, ns.as_str())
    }

    fn read_parsed<T: std::str::FromStr>(
        &self,
        ns: Namespace,
        name: &str,
    ) -> Result<Option<T>, StoreError> {
        Ok(self
            .backend
            .get(&ns.key(name))?
            .and_then(|raw| raw.trim().parse::<T>().ok()))
    }

    fn read_bool(&self, ns: Namespace, name: &str) -> Result<bool, StoreError> {
        Ok(self.read_parsed::<bool>(ns, name)?.unwrap_or(false))
    }

    fn read_instant(&self, ns: Namespace, name: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .read_parsed::<i64>(ns, name)?
            .and_then(DateTime::<Utc>::from_timestamp_millis))
    }
}

fn settings_entries(ns: Namespace, settings: &TimerSettings) -> Vec<(String, Option<String>)> {
    vec![
        (ns.key(HOURLY_RATE), Some(settings.hourly_rate().to_string())),
        (
            ns.key(START_TIME),
            Some(settings.start_time().map(|t| t.to_string()).unwrap_or_default()),
        ),
        (ns.key(DURATION), Some(settings.duration_hours().to_string())),
    ]
}

fn state_entries(ns: Namespace, state: &TimerState) -> Vec<(String, Option<String>)> {
    vec![
        (ns.key(EARNINGS), Some(state.earned.to_string())),
        (ns.key(IS_RUNNING), Some(state.running.to_string())),
        (ns.key(ELAPSED), Some(state.elapsed_secs.to_string())),
        (ns.key(MANUALLY_PAUSED), Some(state.manually_paused.to_string())),
        (
            ns.key(END_TIME),
            state.end_instant.map(|t| t.timestamp_millis().to_string()),
        ),
        (
            ns.key(START_TIMESTAMP),
            state.start_instant.map(|t| t.timestamp_millis().to_string()),
        ),
    ]
}

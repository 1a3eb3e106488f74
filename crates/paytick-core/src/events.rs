use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::Namespace;
use crate::timer::{ClockTime, TimerPhase, TimerSettings};

/// Every engine transition produces an Event.
/// The CLI prints them as JSON; hosts may forward them elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        elapsed_secs: f64,
        /// Start was resolved to yesterday's occurrence of the start time.
        from_yesterday: bool,
        at: DateTime<Utc>,
    },
    TimerScheduled {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        elapsed_secs: f64,
        earned: f64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        elapsed_secs: f64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    TimerCompleted {
        elapsed_secs: f64,
        earned: f64,
        /// Completion was discovered by a resync after a suspend.
        while_suspended: bool,
        at: DateTime<Utc>,
    },
    /// Tick-derived elapsed differed from the clock by more than the tolerance.
    TimerResynced {
        previous_secs: f64,
        actual_secs: f64,
        at: DateTime<Utc>,
    },
    SettingsApplied {
        settings: TimerSettings,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        from: Namespace,
        to: Namespace,
        at: DateTime<Utc>,
    },
    DataCleared {
        namespace: Namespace,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: TimerPhase,
        namespace: Namespace,
        hourly_rate: f64,
        duration_hours: f64,
        elapsed_secs: f64,
        earned: f64,
        remaining_secs: f64,
        progress_pct: f64,
        manually_paused: bool,
        /// Local time of day of `start`.
        start_clock_time: Option<ClockTime>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_completion(&self) -> bool {
        matches!(self, Event::TimerCompleted { .. })
    }
}

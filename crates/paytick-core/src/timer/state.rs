use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::settings::{ClockTime, TimerSettings};

/// Lifecycle phase of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    /// Start instant is in the future; waiting for the auto-start poll.
    Scheduled,
    Running,
    Paused,
    Completed,
}

/// Persisted timer state of one namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub running: bool,
    pub manually_paused: bool,
    pub start_instant: Option<DateTime<Utc>>,
    pub end_instant: Option<DateTime<Utc>>,
    pub elapsed_secs: f64,
    pub earned: f64,
}

impl TimerState {
    /// Phase implied by persisted fields alone.
    pub fn derive_phase(&self, settings: &TimerSettings) -> TimerPhase {
        if self.running {
            TimerPhase::Running
        } else if self.start_instant.is_some() && self.elapsed_secs >= settings.duration_secs() {
            TimerPhase::Completed
        } else if self.manually_paused {
            TimerPhase::Paused
        } else if self.start_instant.is_some() {
            TimerPhase::Scheduled
        } else {
            TimerPhase::Idle
        }
    }

    /// Time of day the timer started at, in the given local offset.
    pub fn start_clock_time(&self, offset: FixedOffset) -> Option<ClockTime> {
        self.start_instant
            .map(|s| ClockTime::from_naive(s.with_timezone(&offset).time()))
    }

    /// Seconds left until the duration cap.
    pub fn remaining_secs(&self, settings: &TimerSettings) -> f64 {
        (settings.duration_secs() - self.elapsed_secs).max(0.0)
    }

    /// 0.0 .. 100.0 progress through the configured duration.
    pub fn progress_pct(&self, settings: &TimerSettings) -> f64 {
        let total = settings.duration_secs();
        if total <= 0.0 {
            return 0.0;
        }
        (self.elapsed_secs / total * 100.0).clamp(0.0, 100.0)
    }

    /// Set elapsed time and derive earnings from it.
    pub(crate) fn set_elapsed(&mut self, elapsed_secs: f64, settings: &TimerSettings) {
        self.elapsed_secs = elapsed_secs;
        self.earned = settings.earned_for(elapsed_secs);
    }

    pub(crate) fn set_start(&mut self, start: DateTime<Utc>, settings: &TimerSettings) {
        self.start_instant = Some(start);
        self.end_instant = start.checked_add_signed(settings.duration());
    }

    pub(crate) fn refresh_end(&mut self, settings: &TimerSettings) {
        self.end_instant = self
            .start_instant
            .and_then(|s| s.checked_add_signed(settings.duration()));
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_HOURLY_RATE: f64 = 15.0;
pub const DEFAULT_DURATION_HOURS: f64 = 8.0;
/// One year. Keeps `start + duration` well inside chrono's range.
pub const MAX_DURATION_HOURS: f64 = 24.0 * 366.0;

/// A time of day with minute resolution, written "HH:MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidClockTime(format!(
                "{hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn to_naive(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Truncates seconds.
    pub fn from_naive(t: NaiveTime) -> Self {
        Self {
            hour: t.hour() as u8,
            minute: t.minute() as u8,
        }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidClockTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour = h.parse::<u8>().map_err(|_| invalid())?;
        let minute = m.parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-namespace timer settings.
///
/// Always valid once constructed: rate and duration are positive and finite,
/// and the duration is at most [`MAX_DURATION_HOURS`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerSettings {
    hourly_rate: f64,
    #[serde(default)]
    start_time: Option<ClockTime>,
    duration_hours: f64,
}

impl TimerSettings {
    pub fn new(
        hourly_rate: f64,
        start_time: Option<ClockTime>,
        duration_hours: f64,
    ) -> Result<Self, ValidationError> {
        let settings = Self {
            hourly_rate,
            start_time,
            duration_hours,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.hourly_rate.is_finite() || self.hourly_rate <= 0.0 {
            return Err(ValidationError::InvalidRate(self.hourly_rate));
        }
        if !self.duration_hours.is_finite()
            || self.duration_hours <= 0.0
            || self.duration_hours > MAX_DURATION_HOURS
        {
            return Err(ValidationError::InvalidDuration(self.duration_hours));
        }
        Ok(())
    }

    pub fn hourly_rate(&self) -> f64 {
        self.hourly_rate
    }

    pub fn start_time(&self) -> Option<ClockTime> {
        self.start_time
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_hours
    }

    /// Duration cap in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration_hours * 3600.0
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::milliseconds((self.duration_secs() * 1000.0).round() as i64)
    }

    pub fn rate_per_sec(&self) -> f64 {
        self.hourly_rate / 3600.0
    }

    pub fn earned_for(&self, elapsed_secs: f64) -> f64 {
        self.rate_per_sec() * elapsed_secs
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            hourly_rate: DEFAULT_HOURLY_RATE,
            start_time: None,
            duration_hours: DEFAULT_DURATION_HOURS,
        }
    }
}

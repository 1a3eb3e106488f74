//! Resolution of a configured "HH:MM" start time into a concrete instant.
//!
//! A time of day is ambiguous around midnight: "23:45" configured at 00:15
//! almost certainly means the shift that began half an hour ago, not one
//! that begins in 23.5 hours. Resolution prefers yesterday's occurrence
//! whenever `now` still falls inside that shift's duration window.

use chrono::{DateTime, Duration, FixedOffset, Utc};

use super::settings::ClockTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartResolution {
    /// Start is at or before `now`. The timer runs, or caps right away if
    /// the window has already passed.
    Immediate {
        start: DateTime<Utc>,
        /// True when yesterday's occurrence was adopted.
        from_yesterday: bool,
    },
    /// Start lies ahead of `now`.
    Future { start: DateTime<Utc> },
}

impl StartResolution {
    pub fn start(&self) -> DateTime<Utc> {
        match *self {
            StartResolution::Immediate { start, .. } | StartResolution::Future { start } => start,
        }
    }
}

/// `time` on the local calendar day containing `now`.
pub fn today_at(time: ClockTime, now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local_day = now.with_timezone(&offset).date_naive();
    local_day
        .and_time(time.to_naive())
        .and_local_timezone(offset)
        .single()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(now)
}

pub fn resolve_start(
    time: ClockTime,
    now: DateTime<Utc>,
    offset: FixedOffset,
    duration: Duration,
) -> StartResolution {
    let today = today_at(time, now, offset);
    let yesterday = today - Duration::hours(24);
    let within_window = |start: DateTime<Utc>| {
        let since = now - start;
        since >= Duration::zero() && since <= duration
    };

    if today > now {
        if within_window(yesterday) {
            StartResolution::Immediate {
                start: yesterday,
                from_yesterday: true,
            }
        } else {
            StartResolution::Future { start: today }
        }
    } else if now - today > duration && within_window(yesterday) {
        StartResolution::Immediate {
            start: yesterday,
            from_yesterday: true,
        }
    } else {
        StartResolution::Immediate {
            start: today,
            from_yesterday: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 14, h, m, 0).unwrap()
    }

    fn hhmm(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn future_today_is_scheduled() {
        let r = resolve_start(hhmm("10:00"), at(8, 0), utc(), Duration::hours(1));
        assert_eq!(r, StartResolution::Future { start: at(10, 0) });
    }

    #[test]
    fn late_night_start_resolves_to_yesterday() {
        let r = resolve_start(hhmm("23:45"), at(0, 15), utc(), Duration::hours(8));
        assert_eq!(
            r,
            StartResolution::Immediate {
                start: Utc.with_ymd_and_hms(2026, 4, 13, 23, 45, 0).unwrap(),
                from_yesterday: true,
            }
        );
    }

    #[test]
    fn past_within_duration_starts_today() {
        let r = resolve_start(hhmm("09:00"), at(10, 30), utc(), Duration::hours(8));
        assert_eq!(
            r,
            StartResolution::Immediate {
                start: at(9, 0),
                from_yesterday: false,
            }
        );
    }

    #[test]
    fn long_expired_start_keeps_literal_time() {
        let r = resolve_start(hhmm("09:00"), at(20, 0), utc(), Duration::hours(8));
        assert_eq!(r.start(), at(9, 0));
    }

    #[test]
    fn multi_day_duration_keeps_todays_start() {
        // Yesterday's 09:00 is also inside a 30h window; today's wins.
        let r = resolve_start(hhmm("09:00"), at(10, 0), utc(), Duration::hours(30));
        assert_eq!(r.start(), at(9, 0));
    }

    #[test]
    fn resolves_in_local_offset() {
        // 07:00 local at UTC+2 is 05:00 UTC.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let r = resolve_start(hhmm("07:00"), at(6, 0), plus_two, Duration::hours(8));
        assert_eq!(
            r,
            StartResolution::Immediate {
                start: at(5, 0),
                from_yesterday: false,
            }
        );
    }
}

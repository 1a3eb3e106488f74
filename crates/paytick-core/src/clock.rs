//! Wall-clock source.
//!
//! The engine never reads the system time directly. Production code uses
//! [`SystemClock`]; tests and simulations use [`ManualClock`] and advance it
//! by hand.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, FixedOffset, Local, Offset, Utc};

/// Source of the current instant and the local UTC offset used to resolve
/// "HH:MM" times of day.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Offset of the user's local time zone at `now`.
    fn local_offset(&self) -> FixedOffset;
}

/// Real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_offset(&self) -> FixedOffset {
        Local::now().offset().fix()
    }
}

/// Manually driven clock.
///
/// Clones share the same underlying time, so a test can keep one handle
/// while the engine owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
    offset: FixedOffset,
}

impl ManualClock {
    /// Clock fixed at `at`, local time equal to UTC.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self::with_offset(at, Utc.fix())
    }

    pub fn with_offset(at: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: Rc::new(Cell::new(at)),
            offset,
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn local_offset(&self) -> FixedOffset {
        self.offset
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn local_offset(&self) -> FixedOffset {
        (**self).local_offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_clones_share_time() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let clock = ManualClock::new(t0);
        let handle = clock.clone();
        handle.advance_secs(90);
        assert_eq!(clock.now(), t0 + Duration::seconds(90));
    }

    #[test]
    fn manual_clock_keeps_offset() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let clock = ManualClock::with_offset(t0, offset);
        assert_eq!(clock.local_offset(), offset);
    }
}

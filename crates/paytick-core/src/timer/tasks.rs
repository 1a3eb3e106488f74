//! Cancellable periodic tasks.
//!
//! Tasks are plain values, not closures. Each one remembers the
//! `start_instant` it was armed for; the engine drops any task whose anchor
//! no longer matches its state, so a reset or a new start can never be
//! observed by a poll armed for an earlier one.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    /// Compare the last tick against a fresh clock read.
    DriftCheck,
    /// Recompute elapsed from `now - start_instant`.
    Recompute,
    /// Wait for a scheduled start instant to pass.
    AutoStart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub kind: TaskKind,
    pub anchor: DateTime<Utc>,
    pub every: Duration,
    pub next_due: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskSet {
    tasks: Vec<ScheduledTask>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind`, replacing any existing task of the same kind.
    pub fn arm(&mut self, kind: TaskKind, anchor: DateTime<Utc>, every: Duration, now: DateTime<Utc>) {
        self.cancel(kind);
        self.tasks.push(ScheduledTask {
            kind,
            anchor,
            every,
            next_due: now + every,
        });
    }

    pub fn cancel(&mut self, kind: TaskKind) {
        self.tasks.retain(|t| t.kind != kind);
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_armed(&self, kind: TaskKind) -> bool {
        self.tasks.iter().any(|t| t.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn anchor(&self, kind: TaskKind) -> Option<DateTime<Utc>> {
        self.tasks.iter().find(|t| t.kind == kind).map(|t| t.anchor)
    }

    /// Earliest due time across armed tasks.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.tasks.iter().map(|t| t.next_due).min()
    }

    /// Collect tasks due at `now` and reschedule them one period ahead of
    /// `now`. Missed periods are skipped rather than replayed. Returned in
    /// `TaskKind` order so a drift check always precedes a recompute.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<(TaskKind, DateTime<Utc>)> {
        let mut due = Vec::new();
        for task in &mut self.tasks {
            if task.next_due <= now {
                due.push((task.kind, task.anchor));
                task.next_due = now + task.every;
            }
        }
        due.sort_by_key(|(kind, _)| *kind);
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn nothing_due_before_first_period() {
        let mut tasks = TaskSet::new();
        tasks.arm(TaskKind::Recompute, t0(), Duration::seconds(1), t0());
        assert!(tasks.take_due(t0()).is_empty());
        assert_eq!(tasks.take_due(t0() + Duration::seconds(1)).len(), 1);
    }

    #[test]
    fn missed_periods_fire_once() {
        let mut tasks = TaskSet::new();
        tasks.arm(TaskKind::Recompute, t0(), Duration::seconds(1), t0());
        let later = t0() + Duration::seconds(30);
        assert_eq!(tasks.take_due(later).len(), 1);
        assert!(tasks.take_due(later).is_empty());
        assert_eq!(tasks.next_due(), Some(later + Duration::seconds(1)));
    }

    #[test]
    fn drift_check_runs_before_recompute() {
        let mut tasks = TaskSet::new();
        tasks.arm(TaskKind::Recompute, t0(), Duration::seconds(1), t0());
        tasks.arm(TaskKind::DriftCheck, t0(), Duration::seconds(10), t0());
        let due = tasks.take_due(t0() + Duration::seconds(10));
        let kinds: Vec<_> = due.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, vec![TaskKind::DriftCheck, TaskKind::Recompute]);
    }

    #[test]
    fn arming_replaces_same_kind() {
        let mut tasks = TaskSet::new();
        let other = t0() + Duration::hours(1);
        tasks.arm(TaskKind::AutoStart, t0(), Duration::seconds(1), t0());
        tasks.arm(TaskKind::AutoStart, other, Duration::seconds(1), t0());
        assert_eq!(tasks.anchor(TaskKind::AutoStart), Some(other));
        tasks.cancel_all();
        assert!(tasks.is_empty());
    }
}

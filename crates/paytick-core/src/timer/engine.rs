//! Earnings timer engine.
//!
//! A wall-clock-based state machine. It has no internal threads: the caller
//! invokes [`EarningsEngine::poll`] periodically and [`EarningsEngine::on_wake`]
//! when the host may have been suspended.
//!
//! Elapsed time is never accumulated. Every recompute reads the clock and
//! derives `elapsed = now - start_instant`, so a missed or late poll cannot
//! skew the result; it only delays when the result is observed.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Scheduled -> Running -> Completed
//!                      Running <-> Paused
//! any  -> Idle (reset)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = EarningsEngine::hydrate(store, SystemClock, EngineConfig::default(),
//!     Namespace::Default, Box::new(NullNotifier));
//! engine.start();
//! // In a loop:
//! for event in engine.poll() { /* render */ }
//! ```

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::resolve::{resolve_start, StartResolution};
use super::settings::TimerSettings;
use super::state::{TimerPhase, TimerState};
use super::tasks::{TaskKind, TaskSet};
use crate::clock::Clock;
use crate::error::ValidationError;
use crate::events::Event;
use crate::notify::{Notifier, Severity};
use crate::storage::{EngineConfig, KvStore, Namespace, StateStore};

const MSG_STARTED: &str = "Timer started! You are now earning";
const MSG_STARTED_YESTERDAY: &str = "Timer started with yesterday's start time";
const MSG_RESUMED: &str = "Timer resumed";
const MSG_PAUSED: &str = "Timer paused";
const MSG_RESET: &str = "Timer reset";
const MSG_SETTINGS: &str = "Settings updated!";
const MSG_COMPLETED: &str = "Work duration completed!";
const MSG_COMPLETED_ASLEEP: &str = "Timer completed while the device was asleep";
const MSG_YESTERDAY_EXCEEDED: &str =
    "Timer started with yesterday's time, but duration already exceeded";
const MSG_CLEARED: &str = "All saved data has been cleared";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartKind {
    Fresh { from_yesterday: bool },
    Resume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompletionCause {
    /// Recompute or drift check reached the cap.
    Tick,
    /// A wake resync revealed the cap passed during suspension.
    Wake,
    /// The adopted start instant was already a full duration ago.
    AtStart { from_yesterday: bool },
}

/// Core earnings timer.
pub struct EarningsEngine<S, C> {
    store: StateStore<S>,
    clock: C,
    config: EngineConfig,
    notifier: Box<dyn Notifier>,
    namespace: Namespace,
    settings: TimerSettings,
    state: TimerState,
    phase: TimerPhase,
    tasks: TaskSet,
    /// Events produced outside a command, e.g. catch-up during hydration.
    pending: Vec<Event>,
}

impl<S: KvStore, C: Clock> EarningsEngine<S, C> {
    /// Build an engine from whatever `namespace` has persisted.
    ///
    /// A timer that was running is resumed from its persisted start instant,
    /// so elapsed time reflects the downtime. If the duration ran out in the
    /// meantime it completes here; a scheduled start that has since passed
    /// begins here. Store failures fall back to defaults.
    pub fn hydrate(
        backend: S,
        clock: C,
        config: EngineConfig,
        namespace: Namespace,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let store = StateStore::new(backend);
        let settings = store.load_settings(namespace).unwrap_or_else(|e| {
            warn!(namespace = %namespace, error = %e, "failed to load settings, using defaults");
            TimerSettings::default()
        });
        let state = store.load_state(namespace).unwrap_or_else(|e| {
            warn!(namespace = %namespace, error = %e, "failed to load timer state, starting idle");
            TimerState::default()
        });

        let mut engine = Self {
            store,
            clock,
            config,
            notifier,
            namespace,
            settings,
            state: TimerState::default(),
            phase: TimerPhase::Idle,
            tasks: TaskSet::new(),
            pending: Vec::new(),
        };
        engine.restore(state);
        engine
    }

    fn restore(&mut self, mut state: TimerState) {
        if state.start_instant.is_none() {
            if state.running || state.elapsed_secs > 0.0 {
                warn!(namespace = %self.namespace, "persisted state has no start instant, resetting");
            }
            state = TimerState::default();
        }
        state.refresh_end(&self.settings);
        let cap = self.settings.duration_secs();
        let elapsed = state.elapsed_secs.min(cap);
        state.set_elapsed(elapsed, &self.settings);

        self.phase = state.derive_phase(&self.settings);
        self.state = state;
        debug!(namespace = %self.namespace, phase = ?self.phase, "hydrated timer");

        let now = self.clock.now();
        match (self.phase, self.state.start_instant) {
            (TimerPhase::Running, Some(start)) => {
                let raw = self.raw_elapsed(now);
                if raw >= cap {
                    let event = self.complete(now, CompletionCause::Tick);
                    self.pending.extend(event);
                } else {
                    self.state.set_elapsed(raw, &self.settings);
                    self.arm_running(start, now);
                }
            }
            (TimerPhase::Scheduled, Some(start)) => {
                self.tasks
                    .arm(TaskKind::AutoStart, start, self.config.auto_start_poll(), now);
                let event = self.auto_start(now);
                self.pending.extend(event);
            }
            _ => {}
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &StateStore<S> {
        &self.store
    }

    pub fn is_task_armed(&self, kind: TaskKind) -> bool {
        self.tasks.is_armed(kind)
    }

    pub fn has_active_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// When the next scheduled task wants to run.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.tasks.next_due()
    }

    pub fn into_store(self) -> S {
        self.store.into_inner()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            namespace: self.namespace,
            hourly_rate: self.settings.hourly_rate(),
            duration_hours: self.settings.duration_hours(),
            elapsed_secs: self.state.elapsed_secs,
            earned: self.state.earned,
            remaining_secs: self.state.remaining_secs(&self.settings),
            progress_pct: self.state.progress_pct(&self.settings),
            manually_paused: self.state.manually_paused,
            start_clock_time: self.state.start_clock_time(self.clock.local_offset()),
            start: self.state.start_instant,
            end: self.state.end_instant,
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start, or resume after a manual pause. No-op while running.
    pub fn start(&mut self) -> Option<Event> {
        if self.phase == TimerPhase::Running {
            return None;
        }
        self.begin(self.can_resume())
    }

    /// Continue a manually paused timer from its existing start instant.
    pub fn resume(&mut self) -> Option<Event> {
        if self.phase != TimerPhase::Paused {
            return None;
        }
        self.start()
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.phase != TimerPhase::Running {
            return None;
        }
        let now = self.clock.now();
        let raw = self.raw_elapsed(now);
        if raw >= self.settings.duration_secs() {
            return self.complete(now, CompletionCause::Tick);
        }

        self.tasks.cancel_all();
        self.state.set_elapsed(raw, &self.settings);
        self.state.running = false;
        self.state.manually_paused = true;
        self.phase = TimerPhase::Paused;
        debug!(elapsed_secs = raw, "timer paused");
        self.persist();
        self.notify(MSG_PAUSED, Severity::Warning);
        Some(Event::TimerPaused {
            elapsed_secs: self.state.elapsed_secs,
            earned: self.state.earned,
            at: now,
        })
    }

    /// Back to idle from any phase.
    pub fn reset(&mut self) -> Option<Event> {
        self.tasks.cancel_all();
        self.state = TimerState::default();
        self.phase = TimerPhase::Idle;
        debug!("timer reset");
        self.persist();
        self.notify(MSG_RESET, Severity::Info);
        Some(Event::TimerReset {
            at: self.clock.now(),
        })
    }

    /// Replace the settings of the active namespace.
    ///
    /// When stopped this starts the timer with the new settings. When running
    /// a changed start time moves the start instant (or schedules it, if it
    /// now lies ahead) and a changed duration moves the end instant.
    ///
    /// # Errors
    /// Returns the validation error, leaving the engine untouched, if the
    /// rate or duration is not positive.
    pub fn apply_settings(
        &mut self,
        settings: TimerSettings,
    ) -> Result<Option<Event>, ValidationError> {
        settings.validate()?;
        let start_changed = settings.start_time() != self.settings.start_time();
        self.settings = settings;
        debug!(?settings, start_changed, "applying settings");

        if self.phase != TimerPhase::Running {
            if start_changed {
                self.state.start_instant = None;
                self.state.end_instant = None;
                self.state.set_elapsed(0.0, &self.settings);
            }
            return Ok(self.begin(!start_changed && self.can_resume()));
        }

        let now = self.clock.now();
        if let (true, Some(time)) = (start_changed, self.settings.start_time()) {
            match resolve_start(
                time,
                now,
                self.clock.local_offset(),
                self.settings.duration(),
            ) {
                StartResolution::Future { start } => return Ok(self.schedule(start, now)),
                StartResolution::Immediate { start, .. } => {
                    self.state.set_start(start, &self.settings);
                }
            }
        }
        self.state.refresh_end(&self.settings);

        let raw = self.raw_elapsed(now);
        if raw >= self.settings.duration_secs() {
            return Ok(self.complete(now, CompletionCause::Tick));
        }
        self.state.set_elapsed(raw, &self.settings);
        if let Some(start) = self.state.start_instant {
            self.arm_running(start, now);
        }
        self.persist();
        self.notify(MSG_SETTINGS, Severity::Success);
        Ok(Some(Event::SettingsApplied {
            settings: self.settings,
            at: now,
        }))
    }

    /// Complete now if the end instant has passed. Idempotent.
    pub fn check_end(&mut self) -> Option<Event> {
        if self.phase != TimerPhase::Running {
            return None;
        }
        let now = self.clock.now();
        let past_end = self.state.end_instant.is_some_and(|end| now >= end);
        if past_end || self.raw_elapsed(now) >= self.settings.duration_secs() {
            return self.complete(now, CompletionCause::Tick);
        }
        None
    }

    /// Run every due task. Call at least once per tick interval.
    pub fn poll(&mut self) -> Vec<Event> {
        let mut events = std::mem::take(&mut self.pending);
        let now = self.clock.now();
        for (kind, anchor) in self.tasks.take_due(now) {
            // An earlier task in this batch may have cancelled this one.
            if !self.tasks.is_armed(kind) {
                continue;
            }
            if self.state.start_instant != Some(anchor) {
                debug!(?kind, "dropping stale task");
                self.tasks.cancel(kind);
                continue;
            }
            match kind {
                TaskKind::DriftCheck => events.extend(self.drift_check(now)),
                TaskKind::Recompute => events.extend(self.recompute(now)),
                TaskKind::AutoStart => events.extend(self.auto_start(now)),
            }
        }
        events
    }

    /// Host signal that the process may have been suspended.
    ///
    /// Recomputes immediately. A jump larger than the wake tolerance that
    /// crosses the cap completes the timer with a distinct notice.
    pub fn on_wake(&mut self) -> Vec<Event> {
        let mut events = std::mem::take(&mut self.pending);
        let now = self.clock.now();
        match self.phase {
            TimerPhase::Running => {
                let fresh = self.raw_elapsed(now);
                let previous = self.state.elapsed_secs;
                let cap = self.settings.duration_secs();
                let jumped = (fresh.min(cap) - previous).abs() > self.config.wake_tolerance_secs;
                if jumped {
                    warn!(previous_secs = previous, actual_secs = fresh, "resync after wake");
                    events.push(Event::TimerResynced {
                        previous_secs: previous,
                        actual_secs: fresh.min(cap),
                        at: now,
                    });
                }
                if fresh >= cap {
                    let cause = if jumped {
                        CompletionCause::Wake
                    } else {
                        CompletionCause::Tick
                    };
                    events.extend(self.complete(now, cause));
                } else {
                    self.state.set_elapsed(fresh, &self.settings);
                    self.notifier.on_state_change(&self.state);
                }
            }
            TimerPhase::Scheduled => events.extend(self.auto_start(now)),
            _ => {}
        }
        events
    }

    /// Reset the timer and forget every stored key of the active namespace.
    /// Settings return to their defaults.
    pub fn clear_all_data(&mut self) -> Event {
        self.tasks.cancel_all();
        self.state = TimerState::default();
        self.settings = TimerSettings::default();
        self.phase = TimerPhase::Idle;
        if let Err(e) = self.store.clear_all(self.namespace) {
            warn!(namespace = %self.namespace, error = %e, "failed to clear stored data");
        }
        info!(namespace = %self.namespace, "cleared all data");
        self.notifier.on_state_change(&self.state);
        self.notify(MSG_CLEARED, Severity::Info);
        Event::DataCleared {
            namespace: self.namespace,
            at: self.clock.now(),
        }
    }

    // ── Mode manager hooks ───────────────────────────────────────────

    pub(crate) fn store_mut(&mut self) -> &mut StateStore<S> {
        &mut self.store
    }

    /// Drop in-memory state and attach to `namespace` with an idle timer.
    pub(crate) fn rebind(&mut self, namespace: Namespace) {
        self.tasks.cancel_all();
        self.pending.clear();
        self.namespace = namespace;
        self.settings = self.store.load_settings(namespace).unwrap_or_else(|e| {
            warn!(namespace = %namespace, error = %e, "failed to load settings, using defaults");
            TimerSettings::default()
        });
        self.state = TimerState::default();
        self.phase = TimerPhase::Idle;
        self.persist();
    }

    pub(crate) fn notify(&mut self, message: &str, severity: Severity) {
        self.notifier.on_notify(message, severity);
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn can_resume(&self) -> bool {
        self.state.manually_paused
            && self.state.elapsed_secs > 0.0
            && self.state.start_instant.is_some()
    }

    fn begin(&mut self, resume: bool) -> Option<Event> {
        let now = self.clock.now();
        self.tasks.cancel_all();
        self.state.manually_paused = false;

        if resume {
            if let Some(start) = self.state.start_instant {
                return self.adopt_start(start, now, StartKind::Resume);
            }
        }

        match self.settings.start_time() {
            None => self.adopt_start(now, now, StartKind::Fresh { from_yesterday: false }),
            Some(time) => match resolve_start(
                time,
                now,
                self.clock.local_offset(),
                self.settings.duration(),
            ) {
                StartResolution::Immediate {
                    start,
                    from_yesterday,
                } => self.adopt_start(start, now, StartKind::Fresh { from_yesterday }),
                StartResolution::Future { start } => self.schedule(start, now),
            },
        }
    }

    fn adopt_start(&mut self, start: DateTime<Utc>, now: DateTime<Utc>, kind: StartKind) -> Option<Event> {
        self.state.set_start(start, &self.settings);
        self.state.running = true;
        self.phase = TimerPhase::Running;

        let raw = self.raw_elapsed(now);
        if raw >= self.settings.duration_secs() {
            let from_yesterday = matches!(kind, StartKind::Fresh { from_yesterday: true });
            return self.complete(now, CompletionCause::AtStart { from_yesterday });
        }

        self.state.set_elapsed(raw, &self.settings);
        self.arm_running(start, now);
        debug!(%start, elapsed_secs = raw, ?kind, "timer running");
        self.persist();

        match kind {
            StartKind::Resume => {
                self.notify(MSG_RESUMED, Severity::Success);
                Some(Event::TimerResumed {
                    elapsed_secs: raw,
                    at: now,
                })
            }
            StartKind::Fresh { from_yesterday } => {
                let message = if from_yesterday {
                    MSG_STARTED_YESTERDAY
                } else {
                    MSG_STARTED
                };
                self.notify(message, Severity::Success);
                Some(Event::TimerStarted {
                    start,
                    end: start + self.settings.duration(),
                    elapsed_secs: raw,
                    from_yesterday,
                    at: now,
                })
            }
        }
    }

    fn schedule(&mut self, start: DateTime<Utc>, now: DateTime<Utc>) -> Option<Event> {
        self.tasks.cancel_all();
        self.state.set_start(start, &self.settings);
        self.state.running = false;
        self.state.set_elapsed(0.0, &self.settings);
        self.phase = TimerPhase::Scheduled;
        self.tasks
            .arm(TaskKind::AutoStart, start, self.config.auto_start_poll(), now);
        debug!(%start, "timer scheduled");
        self.persist();

        let label = self
            .settings
            .start_time()
            .or_else(|| self.state.start_clock_time(self.clock.local_offset()))
            .map(|t| t.to_string())
            .unwrap_or_default();
        self.notify(&format!("Timer will start at {label}"), Severity::Info);
        Some(Event::TimerScheduled {
            start,
            end: start + self.settings.duration(),
            at: now,
        })
    }

    fn auto_start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let start = match (self.phase, self.state.start_instant) {
            (TimerPhase::Scheduled, Some(start)) if !self.state.manually_paused => start,
            _ => {
                self.tasks.cancel(TaskKind::AutoStart);
                return None;
            }
        };
        if now < start {
            return None;
        }
        self.tasks.cancel(TaskKind::AutoStart);
        info!(%start, "scheduled start reached");
        self.adopt_start(start, now, StartKind::Fresh { from_yesterday: false })
    }

    fn recompute(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.phase != TimerPhase::Running {
            return None;
        }
        let raw = self.raw_elapsed(now);
        let past_end = self.state.end_instant.is_some_and(|end| now >= end);
        if past_end || raw >= self.settings.duration_secs() {
            return self.complete(now, CompletionCause::Tick);
        }
        self.state.set_elapsed(raw, &self.settings);
        self.notifier.on_state_change(&self.state);
        None
    }

    fn drift_check(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.phase != TimerPhase::Running {
            return Vec::new();
        }
        let fresh = self.raw_elapsed(now);
        let cap = self.settings.duration_secs();
        let previous = self.state.elapsed_secs;
        // Runs ahead of the recompute it shares a poll with, so `previous`
        // trails the clock by up to one tick even when no tick was missed.
        let tick_lag = self.config.tick_interval().num_milliseconds() as f64 / 1000.0;
        if (fresh.min(cap) - previous).abs() <= tick_lag + self.config.drift_tolerance_secs {
            return Vec::new();
        }

        warn!(previous_secs = previous, actual_secs = fresh, "elapsed drifted from clock, resyncing");
        let mut events = vec![Event::TimerResynced {
            previous_secs: previous,
            actual_secs: fresh.min(cap),
            at: now,
        }];
        if fresh >= cap {
            events.extend(self.complete(now, CompletionCause::Tick));
        } else {
            self.state.set_elapsed(fresh, &self.settings);
            self.notifier.on_state_change(&self.state);
        }
        events
    }

    fn complete(&mut self, now: DateTime<Utc>, cause: CompletionCause) -> Option<Event> {
        if self.phase == TimerPhase::Completed {
            return None;
        }
        self.tasks.cancel_all();
        let cap = self.settings.duration_secs();
        self.state.set_elapsed(cap, &self.settings);
        self.state.running = false;
        self.state.manually_paused = false;
        self.phase = TimerPhase::Completed;
        info!(earned = self.state.earned, ?cause, "work duration completed");
        self.persist();

        self.notifier.on_completed();
        let (message, severity) = match cause {
            CompletionCause::Tick | CompletionCause::AtStart { from_yesterday: false } => {
                (MSG_COMPLETED, Severity::Success)
            }
            CompletionCause::Wake => (MSG_COMPLETED_ASLEEP, Severity::Success),
            CompletionCause::AtStart { from_yesterday: true } => {
                (MSG_YESTERDAY_EXCEEDED, Severity::Warning)
            }
        };
        self.notify(message, severity);
        Some(Event::TimerCompleted {
            elapsed_secs: cap,
            earned: self.state.earned,
            while_suspended: cause == CompletionCause::Wake,
            at: now,
        })
    }

    fn arm_running(&mut self, start: DateTime<Utc>, now: DateTime<Utc>) {
        self.tasks.cancel(TaskKind::AutoStart);
        self.tasks
            .arm(TaskKind::Recompute, start, self.config.tick_interval(), now);
        self.tasks
            .arm(TaskKind::DriftCheck, start, self.config.drift_check_interval(), now);
    }

    /// Seconds since the start instant, uncapped, never negative.
    fn raw_elapsed(&self, now: DateTime<Utc>) -> f64 {
        let Some(start) = self.state.start_instant else {
            return 0.0;
        };
        let secs = (now - start).num_milliseconds() as f64 / 1000.0;
        if secs < 0.0 {
            if self.phase == TimerPhase::Running {
                warn!(elapsed_secs = secs, "clock moved behind start instant, clamping to zero");
            }
            return 0.0;
        }
        secs
    }

    fn persist(&mut self) {
        if let Err(e) = self
            .store
            .persist(self.namespace, &self.state, &self.settings)
        {
            warn!(namespace = %self.namespace, error = %e, "failed to persist timer state, continuing in memory");
        }
        self.notifier.on_state_change(&self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
    }

    fn engine_at(
        at: DateTime<Utc>,
    ) -> (
        EarningsEngine<MemoryStore, ManualClock>,
        ManualClock,
        RecordingNotifier,
    ) {
        let clock = ManualClock::new(at);
        let notes = RecordingNotifier::new();
        let engine = EarningsEngine::hydrate(
            MemoryStore::new(),
            clock.clone(),
            EngineConfig::default(),
            Namespace::Default,
            Box::new(notes.clone()),
        );
        (engine, clock, notes)
    }

    fn settings(rate: f64, start: Option<&str>, hours: f64) -> TimerSettings {
        TimerSettings::new(rate, start.map(|s| s.parse().unwrap()), hours).unwrap()
    }

    #[test]
    fn start_pause_resume() {
        let (mut engine, clock, _) = engine_at(t0());
        assert_eq!(engine.phase(), TimerPhase::Idle);

        assert!(engine.start().is_some());
        assert_eq!(engine.phase(), TimerPhase::Running);
        assert!(engine.start().is_none());

        clock.advance_secs(60);
        assert!(engine.pause().is_some());
        assert_eq!(engine.phase(), TimerPhase::Paused);
        assert!(engine.state().manually_paused);
        assert!(!engine.has_active_tasks());

        clock.advance_secs(60);
        match engine.resume() {
            Some(Event::TimerResumed { elapsed_secs, .. }) => assert_eq!(elapsed_secs, 120.0),
            other => panic!("expected TimerResumed, got {other:?}"),
        }
        assert_eq!(engine.state().start_instant, Some(t0()));
    }

    #[test]
    fn pause_is_noop_unless_running() {
        let (mut engine, _, notes) = engine_at(t0());
        assert!(engine.pause().is_none());
        assert!(engine.resume().is_none());
        assert!(notes.notices().is_empty());
    }

    #[test]
    fn reset_clears_everything_and_cancels_tasks() {
        let (mut engine, clock, _) = engine_at(t0());
        engine.start();
        clock.advance_secs(5);
        engine.poll();
        engine.reset();
        assert_eq!(engine.phase(), TimerPhase::Idle);
        assert_eq!(engine.state(), &TimerState::default());
        assert!(!engine.has_active_tasks());

        clock.advance_secs(30);
        assert!(engine.poll().is_empty());
        assert_eq!(engine.state().elapsed_secs, 0.0);
    }

    #[test]
    fn apply_settings_rejects_invalid_without_side_effects() {
        let (mut engine, _, notes) = engine_at(t0());
        let bad = serde_json::from_value::<TimerSettings>(serde_json::json!({
            "hourly_rate": 0.0,
            "start_time": null,
            "duration_hours": 8.0,
        }))
        .unwrap();
        assert_eq!(
            engine.apply_settings(bad),
            Err(ValidationError::InvalidRate(0.0))
        );
        assert_eq!(engine.phase(), TimerPhase::Idle);
        assert_eq!(engine.settings(), &TimerSettings::default());
        assert!(notes.notices().is_empty());
    }

    #[test]
    fn apply_settings_while_running_updates_rate_and_end() {
        let (mut engine, clock, notes) = engine_at(t0());
        engine.apply_settings(settings(10.0, None, 8.0)).unwrap();
        clock.advance_secs(3600);
        engine
            .apply_settings(settings(20.0, None, 2.0))
            .unwrap()
            .expect("settings event");
        assert_eq!(engine.phase(), TimerPhase::Running);
        assert!((engine.state().earned - 20.0).abs() < 1e-9);
        assert_eq!(engine.state().end_instant, Some(t0() + Duration::hours(2)));
        assert_eq!(notes.notices().last().map(String::as_str), Some(MSG_SETTINGS));
    }

    #[test]
    fn shortening_duration_below_elapsed_completes() {
        let (mut engine, clock, notes) = engine_at(t0());
        engine.apply_settings(settings(30.0, None, 8.0)).unwrap();
        clock.advance_secs(2 * 3600);
        let event = engine.apply_settings(settings(30.0, None, 1.0)).unwrap();
        assert!(event.is_some_and(|e| e.is_completion()));
        assert_eq!(engine.phase(), TimerPhase::Completed);
        assert_eq!(engine.state().elapsed_secs, 3600.0);
        assert_eq!(notes.completions(), 1);
    }

    #[test]
    fn moving_start_time_into_future_reschedules() {
        let (mut engine, clock, _) = engine_at(t0());
        engine.apply_settings(settings(30.0, Some("08:00"), 8.0)).unwrap();
        assert_eq!(engine.phase(), TimerPhase::Running);
        assert_eq!(engine.state().elapsed_secs, 3600.0);

        clock.advance_secs(60);
        engine.apply_settings(settings(30.0, Some("11:00"), 8.0)).unwrap();
        assert_eq!(engine.phase(), TimerPhase::Scheduled);
        assert!(!engine.state().running);
        assert_eq!(engine.state().elapsed_secs, 0.0);
        assert!(engine.is_task_armed(TaskKind::AutoStart));
        assert!(!engine.is_task_armed(TaskKind::Recompute));
    }

    #[test]
    fn moving_start_time_earlier_keeps_running() {
        let (mut engine, _, _) = engine_at(t0());
        engine.apply_settings(settings(36.0, Some("08:30"), 8.0)).unwrap();
        engine.apply_settings(settings(36.0, Some("08:00"), 8.0)).unwrap();
        assert_eq!(engine.phase(), TimerPhase::Running);
        assert_eq!(engine.state().elapsed_secs, 3600.0);
        assert!((engine.state().earned - 36.0).abs() < 1e-9);
    }

    #[test]
    fn check_end_is_idempotent() {
        let (mut engine, clock, notes) = engine_at(t0());
        engine.apply_settings(settings(20.0, None, 1.0)).unwrap();
        clock.advance_secs(3700);
        assert!(engine.check_end().is_some());
        let after_first = engine.state().clone();
        assert!(engine.check_end().is_none());
        assert_eq!(engine.state(), &after_first);
        assert_eq!(notes.completions(), 1);
    }

    #[test]
    fn stale_tasks_are_dropped() {
        let (mut engine, clock, _) = engine_at(t0());
        engine.start();
        // Swap the anchor behind the task set's back.
        engine.state.start_instant = Some(t0() - Duration::hours(1));
        clock.advance_secs(1);
        assert!(engine.poll().is_empty());
        assert!(!engine.is_task_armed(TaskKind::Recompute));
    }

    #[test]
    fn negative_clock_jump_clamps_to_zero() {
        let (mut engine, clock, _) = engine_at(t0());
        engine.start();
        clock.set(t0() - Duration::seconds(30));
        assert_eq!(engine.on_wake().len(), 0);
        assert_eq!(engine.state().elapsed_secs, 0.0);
        assert_eq!(engine.state().earned, 0.0);
    }

    #[test]
    fn apply_settings_rejects_out_of_range_duration() {
        let (mut engine, _, _) = engine_at(t0());
        let huge = serde_json::from_value::<TimerSettings>(serde_json::json!({
            "hourly_rate": 20.0,
            "start_time": null,
            "duration_hours": 1e10,
        }))
        .unwrap();
        assert_eq!(
            engine.apply_settings(huge),
            Err(ValidationError::InvalidDuration(1e10))
        );
        assert_eq!(engine.phase(), TimerPhase::Idle);
        assert!(engine.state().end_instant.is_none());
    }

    #[test]
    fn hydrate_ignores_stored_out_of_range_duration() {
        let mut backend = MemoryStore::new();
        backend.set("duration", "1e10").unwrap();
        backend.set("isRunning", "true").unwrap();
        backend
            .set("startTimestamp", &t0().timestamp_millis().to_string())
            .unwrap();
        let engine = EarningsEngine::hydrate(
            backend,
            ManualClock::new(t0() + Duration::hours(1)),
            EngineConfig::default(),
            Namespace::Default,
            Box::new(RecordingNotifier::new()),
        );
        assert_eq!(engine.settings().duration_hours(), 8.0);
        assert_eq!(engine.phase(), TimerPhase::Running);
        assert_eq!(engine.state().end_instant, Some(t0() + Duration::hours(8)));
    }

    #[test]
    fn oversized_cadences_do_not_overflow() {
        let config = EngineConfig {
            tick_interval_ms: u64::MAX,
            auto_start_poll_ms: u64::MAX,
            drift_check_interval_ms: u64::MAX,
            ..EngineConfig::default()
        };
        let clock = ManualClock::new(t0());
        let mut engine = EarningsEngine::hydrate(
            MemoryStore::new(),
            clock.clone(),
            config,
            Namespace::Default,
            Box::new(RecordingNotifier::new()),
        );
        engine.start();
        assert_eq!(engine.next_due(), Some(t0() + Duration::hours(1)));
        clock.advance(Duration::hours(1));
        assert!(engine.poll().is_empty());
        assert_eq!(engine.state().elapsed_secs, 3600.0);
    }

    #[test]
    fn drift_check_allows_one_tick_of_lag() {
        let (mut engine, clock, _) = engine_at(t0());
        engine.start();
        let mut events = Vec::new();
        for _ in 0..10 {
            clock.advance_secs(1);
            events.extend(engine.poll());
        }
        assert!(events.is_empty(), "unexpected resync: {events:?}");

        // Skip two ticks before the next drift check at 20s.
        for _ in 0..7 {
            clock.advance_secs(1);
            engine.poll();
        }
        clock.advance_secs(3);
        match engine.poll().as_slice() {
            [Event::TimerResynced {
                previous_secs,
                actual_secs,
                ..
            }] => {
                assert_eq!(*previous_secs, 17.0);
                assert_eq!(*actual_secs, 20.0);
            }
            other => panic!("expected a resync, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_reports_progress() {
        let (mut engine, clock, _) = engine_at(t0());
        engine.apply_settings(settings(20.0, None, 1.0)).unwrap();
        clock.advance_secs(900);
        engine.poll();
        match engine.snapshot() {
            Event::StateSnapshot {
                phase,
                progress_pct,
                remaining_secs,
                start_clock_time,
                ..
            } => {
                assert_eq!(phase, TimerPhase::Running);
                assert_eq!(start_clock_time.map(|t| t.to_string()).as_deref(), Some("09:00"));
                assert!((progress_pct - 25.0).abs() < 1e-9);
                assert!((remaining_secs - 2700.0).abs() < 1e-9);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }
}

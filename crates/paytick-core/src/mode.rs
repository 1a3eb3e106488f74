//! Active-namespace management.
//!
//! Owns the engine and the explicit [`Namespace`] it is bound to. Switching
//! modes stops the timer, forgets the outgoing namespace's timer state
//! (in memory and in the store) and rebinds the engine to the incoming
//! namespace with its own settings and an idle timer. Settings of both
//! namespaces survive a switch.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::events::Event;
use crate::notify::{Notifier, Severity};
use crate::storage::{EngineConfig, KvStore, Namespace, StateStore};
use crate::timer::EarningsEngine;

pub struct ModeManager<S, C> {
    active: Namespace,
    engine: EarningsEngine<S, C>,
}

impl<S: KvStore, C: Clock> ModeManager<S, C> {
    /// Hydrate the engine for whichever namespace was last active.
    pub fn open(backend: S, clock: C, config: EngineConfig, notifier: Box<dyn Notifier>) -> Self {
        let store = StateStore::new(backend);
        let active = store.load_active().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read active mode, using default");
            None
        });
        let active = active.unwrap_or_default();
        let engine = EarningsEngine::hydrate(store.into_inner(), clock, config, active, notifier);
        Self { active, engine }
    }

    pub fn active(&self) -> Namespace {
        self.active
    }

    pub fn engine(&self) -> &EarningsEngine<S, C> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut EarningsEngine<S, C> {
        &mut self.engine
    }

    pub fn into_engine(self) -> EarningsEngine<S, C> {
        self.engine
    }

    /// Make `to` the active namespace. No-op if it already is.
    pub fn switch_to(&mut self, to: Namespace) -> Option<Event> {
        let from = self.active;
        if from == to {
            return None;
        }

        if let Err(e) = self.engine.store_mut().clear_state(from) {
            warn!(namespace = %from, error = %e, "failed to clear outgoing timer state");
        }
        self.engine.rebind(to);
        if let Err(e) = self.engine.store_mut().save_active(to) {
            warn!(namespace = %to, error = %e, "failed to persist active mode");
        }
        self.active = to;

        info!(%from, %to, "switched mode");
        self.engine
            .notify(&format!("Switched to {to} mode"), Severity::Info);
        Some(Event::ModeSwitched {
            from,
            to,
            at: self.now(),
        })
    }

    /// Switch between the two namespaces.
    pub fn toggle(&mut self) -> Option<Event> {
        let to = match self.active {
            Namespace::Default => Namespace::Alternate,
            Namespace::Alternate => Namespace::Default,
        };
        self.switch_to(to)
    }

    fn now(&self) -> DateTime<Utc> {
        self.engine.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;
    use crate::timer::{TimerPhase, TimerSettings, TimerState};
    use chrono::TimeZone;

    fn manager() -> (ModeManager<MemoryStore, ManualClock>, ManualClock, RecordingNotifier) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0).unwrap());
        let notes = RecordingNotifier::new();
        let mgr = ModeManager::open(
            MemoryStore::new(),
            clock.clone(),
            EngineConfig::default(),
            Box::new(notes.clone()),
        );
        (mgr, clock, notes)
    }

    #[test]
    fn opens_in_default_mode() {
        let (mgr, _, _) = manager();
        assert_eq!(mgr.active(), Namespace::Default);
        assert_eq!(mgr.engine().namespace(), Namespace::Default);
    }

    #[test]
    fn switching_to_same_mode_is_noop() {
        let (mut mgr, _, notes) = manager();
        assert!(mgr.switch_to(Namespace::Default).is_none());
        assert!(notes.notices().is_empty());
    }

    #[test]
    fn switch_resets_timer_and_keeps_settings() {
        let (mut mgr, clock, notes) = manager();
        let day = TimerSettings::new(40.0, None, 4.0).unwrap();
        mgr.engine_mut().apply_settings(day).unwrap();
        clock.advance_secs(600);
        mgr.engine_mut().poll();
        notes.clear();

        assert!(mgr.switch_to(Namespace::Alternate).is_some());
        assert_eq!(notes.notices(), vec!["Switched to alternate mode".to_string()]);
        assert_eq!(mgr.active(), Namespace::Alternate);
        assert_eq!(mgr.engine().phase(), TimerPhase::Idle);
        assert_eq!(mgr.engine().state(), &TimerState::default());
        assert_eq!(mgr.engine().settings(), &TimerSettings::default());
        assert!(!mgr.engine().has_active_tasks());

        let store = mgr.engine().store();
        assert_eq!(store.load_state(Namespace::Default).unwrap(), TimerState::default());
        assert_eq!(store.load_settings(Namespace::Default).unwrap(), day);
        assert_eq!(store.load_active().unwrap(), Some(Namespace::Alternate));

        mgr.toggle();
        assert_eq!(mgr.engine().settings(), &day);
        assert_eq!(mgr.engine().phase(), TimerPhase::Idle);
    }

    #[test]
    fn reopen_restores_active_mode() {
        let (mut mgr, clock, _) = manager();
        mgr.switch_to(Namespace::Alternate);
        let alt = TimerSettings::new(99.0, None, 2.0).unwrap();
        mgr.engine_mut().apply_settings(alt).unwrap();
        let store = mgr.into_engine().into_store();

        let reopened = ModeManager::open(
            store,
            clock,
            EngineConfig::default(),
            Box::new(RecordingNotifier::new()),
        );
        assert_eq!(reopened.active(), Namespace::Alternate);
        assert_eq!(reopened.engine().settings(), &alt);
        assert_eq!(reopened.engine().phase(), TimerPhase::Running);
    }
}

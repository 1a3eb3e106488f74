//! Collaborator interface for presentation layers.
//!
//! The engine reports every persisted state change, every completion and
//! every human-readable notice here. Implementations render; they hold no
//! timer logic.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
}

pub trait Notifier {
    fn on_state_change(&mut self, _state: &TimerState) {}

    fn on_completed(&mut self) {}

    fn on_notify(&mut self, message: &str, severity: Severity);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn on_notify(&mut self, _message: &str, _severity: Severity) {}
}

/// Forwards notices to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn on_completed(&mut self) {
        tracing::info!("work duration completed");
    }

    fn on_notify(&mut self, message: &str, severity: Severity) {
        match severity {
            Severity::Warning => tracing::warn!(%message, "notice"),
            _ => tracing::info!(%message, ?severity, "notice"),
        }
    }
}

/// Everything a [`RecordingNotifier`] has seen.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub notices: Vec<(String, Severity)>,
    pub completions: usize,
    pub state_changes: usize,
}

/// Records calls into a shared buffer. Clones share the buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    log: Rc<RefCell<Recorded>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Recorded {
        self.log.borrow().clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.log
            .borrow()
            .notices
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }

    pub fn completions(&self) -> usize {
        self.log.borrow().completions
    }

    pub fn clear(&self) {
        *self.log.borrow_mut() = Recorded::default();
    }
}

impl Notifier for RecordingNotifier {
    fn on_state_change(&mut self, _state: &TimerState) {
        self.log.borrow_mut().state_changes += 1;
    }

    fn on_completed(&mut self) {
        self.log.borrow_mut().completions += 1;
    }

    fn on_notify(&mut self, message: &str, severity: Severity) {
        self.log
            .borrow_mut()
            .notices
            .push((message.to_string(), severity));
    }
}

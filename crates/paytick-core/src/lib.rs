//! # paytick Core Library
//!
//! Core logic for paytick, a personal time-and-earnings tracker. Given an
//! hourly rate and a work duration it accrues earnings in real time from a
//! wall-clock start, survives process restarts, and stops on its own once
//! the duration is reached. The `paytick` CLI is a thin layer over this
//! crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a wall-clock-based state machine; the caller
//!   periodically invokes `poll()` and forwards wake signals
//! - **Storage**: a flat key-value store (SQLite or in-memory) split into
//!   two namespaces, plus TOML configuration
//! - **Mode Manager**: switches the active namespace
//!
//! ## Key Components
//!
//! - [`EarningsEngine`]: Core timer state machine
//! - [`ModeManager`]: Active namespace ownership
//! - [`StateStore`]: Namespaced persistence of settings and timer state
//! - [`Config`]: Application configuration management
//! - [`Notifier`]: Collaborator interface for presentation layers

pub mod clock;
pub mod display;
pub mod error;
pub mod events;
pub mod mode;
pub mod notify;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use mode::ModeManager;
pub use notify::{LogNotifier, Notifier, NullNotifier, RecordingNotifier, Severity};
pub use storage::{Config, EngineConfig, KvStore, MemoryStore, Namespace, SqliteStore, StateStore};
pub use timer::{ClockTime, EarningsEngine, TimerPhase, TimerSettings, TimerState};

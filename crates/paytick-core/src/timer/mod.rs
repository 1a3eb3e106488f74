mod engine;
mod resolve;
mod settings;
mod state;
mod tasks;

pub use engine::EarningsEngine;
pub use resolve::{resolve_start, today_at, StartResolution};
pub use settings::{
    ClockTime, TimerSettings, DEFAULT_DURATION_HOURS, DEFAULT_HOURLY_RATE, MAX_DURATION_HOURS,
};
pub use state::{TimerPhase, TimerState};
pub use tasks::{ScheduledTask, TaskKind, TaskSet};

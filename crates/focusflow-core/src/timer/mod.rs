mod engine;
mod options;
mod tasks;

pub use engine::{TimerEngine, TimerState, TimerStatus};
pub use options::{
    DurationLimits, PausedResize, TimerOptions, DEFAULT_COMPLETION_HOLD, DEFAULT_DURATION_SECS,
    TICK_PERIOD,
};
pub use tasks::{TaskHandle, TaskKind, TaskQueue};

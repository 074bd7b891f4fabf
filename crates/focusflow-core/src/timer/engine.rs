//! Timer engine implementation.
//!
//! The timer engine is a countdown state machine driven by tasks on a
//! [`TaskQueue`]. It does not use internal threads: the caller pops due
//! tasks from the queue and hands them to [`TimerEngine::on_task`].
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> Completed -> (hold) -> Idle
//!                      \-> Idle (reset / configure)
//! ```
//!
//! The engine owns at most one tick task and one completion-hold task.
//! Leaving `Running` cancels the tick; `start`, `reset` and `configure`
//! cancel a pending hold. Fired handles the engine no longer owns are
//! ignored.
//!
//! ## Usage
//!
//! ```ignore
//! let mut tasks = TaskQueue::new();
//! let mut engine = TimerEngine::new(25 * 60, TimerOptions::default());
//! engine.start(&Identity::new("alice"), &mut tasks)?;
//! while let Some(handle) = tasks.pop_due(deadline) {
//!     if let Some(event) = engine.on_task(handle, &mut tasks) { /* ... */ }
//! }
//! ```

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::options::{PausedResize, TimerOptions, TICK_PERIOD};
use super::tasks::{TaskHandle, TaskKind, TaskQueue};
use crate::error::TimerError;
use crate::events::Event;
use crate::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    /// Countdown hit zero; waiting out the display hold.
    Completed,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
            TimerStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Status and countdown value, as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub status: TimerStatus,
    pub remaining_secs: u32,
}

/// Core timer engine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    options: TimerOptions,
    duration_secs: u32,
    status: TimerStatus,
    remaining_secs: u32,
    tick_task: Option<TaskHandle>,
    hold_task: Option<TaskHandle>,
}

impl TimerEngine {
    /// Create an idle engine with the countdown at the full duration.
    ///
    /// The duration is not validated here; `start` rejects an out-of-range
    /// value. Zero is bumped to one second.
    pub fn new(duration_secs: u32, options: TimerOptions) -> Self {
        let duration_secs = duration_secs.max(1);
        Self {
            options,
            duration_secs,
            status: TimerStatus::Idle,
            remaining_secs: duration_secs,
            tick_task: None,
            hold_task: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn state(&self) -> TimerState {
        TimerState {
            status: self.status,
            remaining_secs: self.remaining_secs,
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn options(&self) -> &TimerOptions {
        &self.options
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.duration_secs - self.remaining_secs
    }

    /// 0.0 .. 1.0 progress through the current session.
    pub fn progress(&self) -> f64 {
        f64::from(self.elapsed_secs()) / f64::from(self.duration_secs)
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Whether a completion hold is waiting to return the timer to idle.
    pub fn is_holding(&self) -> bool {
        self.hold_task.is_some()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Change the session length. Not allowed while running.
    ///
    /// # Errors
    /// [`TimerError::NotAllowed`] while running, [`TimerError::InvalidDuration`]
    /// when `duration_secs` is out of range. State is unchanged on error.
    pub fn configure(
        &mut self,
        duration_secs: u32,
        tasks: &mut TaskQueue,
    ) -> Result<Event, TimerError> {
        self.ensure_not_running("configure")?;
        let duration_secs = self.options.limits.check(duration_secs)?;

        let elapsed = self.elapsed_secs();
        self.cancel_hold(tasks);
        self.duration_secs = duration_secs;

        let preserve = self.status == TimerStatus::Paused
            && self.options.paused_resize == PausedResize::PreserveElapsed
            && elapsed > 0
            && elapsed < duration_secs;
        if preserve {
            self.remaining_secs = duration_secs - elapsed;
        } else {
            self.rebase();
        }
        tracing::debug!(duration_secs, status = %self.status, "timer configured");

        Ok(Event::DurationConfigured {
            duration_secs,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Start a new session, or resume a paused one.
    ///
    /// # Errors
    /// [`TimerError::NotAllowed`] while running, [`TimerError::IdentityRequired`]
    /// for an empty identity, [`TimerError::InvalidDuration`] when the
    /// configured duration is out of range. State is unchanged on error.
    pub fn start(
        &mut self,
        identity: &Identity,
        tasks: &mut TaskQueue,
    ) -> Result<Event, TimerError> {
        self.ensure_not_running("start")?;
        if identity.is_empty() {
            return Err(TimerError::IdentityRequired);
        }
        self.options.limits.check(self.duration_secs)?;

        let resumed = self.status == TimerStatus::Paused
            && self.remaining_secs > 0
            && self.remaining_secs < self.duration_secs;
        if self.remaining_secs == self.duration_secs || self.remaining_secs == 0 {
            self.remaining_secs = self.duration_secs;
        }

        self.cancel_hold(tasks);
        self.cancel_tick(tasks);
        self.tick_task = Some(tasks.schedule_every(TaskKind::Tick, TICK_PERIOD));
        self.status = TimerStatus::Running;
        tracing::debug!(remaining_secs = self.remaining_secs, resumed, "timer started");

        Ok(Event::TimerStarted {
            nickname: identity.nickname().to_string(),
            duration_secs: self.duration_secs,
            remaining_secs: self.remaining_secs,
            resumed,
            at: Utc::now(),
        })
    }

    /// Stop the countdown, keeping the remaining time.
    ///
    /// Pausing before the first tick leaves `Paused` at the full duration;
    /// the next `start` then begins a fresh session rather than a resume.
    ///
    /// # Errors
    /// [`TimerError::NotAllowed`] unless running.
    pub fn pause(&mut self, tasks: &mut TaskQueue) -> Result<Event, TimerError> {
        if self.status != TimerStatus::Running {
            return Err(TimerError::NotAllowed {
                command: "pause",
                status: self.status,
            });
        }
        self.cancel_tick(tasks);
        self.status = TimerStatus::Paused;
        tracing::debug!(remaining_secs = self.remaining_secs, "timer paused");

        Ok(Event::TimerPaused {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Return to idle with the full duration.
    ///
    /// # Errors
    /// [`TimerError::NotAllowed`] while running.
    pub fn reset(&mut self, tasks: &mut TaskQueue) -> Result<Event, TimerError> {
        self.ensure_not_running("reset")?;
        self.cancel_hold(tasks);
        self.rebase();
        tracing::debug!(duration_secs = self.duration_secs, "timer reset");

        Ok(Event::TimerReset {
            duration_secs: self.duration_secs,
            at: Utc::now(),
        })
    }

    /// Advance the countdown by one second.
    ///
    /// A no-op unless running. Returns `Some(Event::TimerCompleted)` on the
    /// tick that reaches zero.
    pub fn tick(&mut self, tasks: &mut TaskQueue) -> Option<Event> {
        if self.status != TimerStatus::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }

        self.cancel_tick(tasks);
        self.status = TimerStatus::Completed;
        self.hold_task = Some(
            tasks.schedule_once(TaskKind::CompletionHold, self.options.completion_hold),
        );
        tracing::debug!(duration_secs = self.duration_secs, "timer completed");

        Some(Event::TimerCompleted {
            duration_secs: self.duration_secs,
            at: Utc::now(),
        })
    }

    /// Handle a fired task. Handles the engine no longer owns are ignored.
    pub fn on_task(&mut self, handle: TaskHandle, tasks: &mut TaskQueue) -> Option<Event> {
        if self.tick_task == Some(handle) {
            return self.tick(tasks);
        }
        if self.hold_task == Some(handle) {
            self.hold_task = None;
            return self.finish_hold();
        }
        tracing::debug!(kind = ?handle.kind(), "ignoring stale task");
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ensure_not_running(&self, command: &'static str) -> Result<(), TimerError> {
        if self.status == TimerStatus::Running {
            return Err(TimerError::NotAllowed {
                command,
                status: self.status,
            });
        }
        Ok(())
    }

    fn rebase(&mut self) {
        self.status = TimerStatus::Idle;
        self.remaining_secs = self.duration_secs;
    }

    fn finish_hold(&mut self) -> Option<Event> {
        if self.status != TimerStatus::Completed {
            return None;
        }
        self.rebase();
        Some(Event::CompletionHoldElapsed {
            duration_secs: self.duration_secs,
            at: Utc::now(),
        })
    }

    fn cancel_tick(&mut self, tasks: &mut TaskQueue) {
        if let Some(handle) = self.tick_task.take() {
            tasks.cancel(handle);
        }
    }

    fn cancel_hold(&mut self, tasks: &mut TaskQueue) {
        if let Some(handle) = self.hold_task.take() {
            tasks.cancel(handle);
        }
    }
}

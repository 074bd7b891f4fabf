use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TimerError;

/// Period of the countdown tick.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Default display hold at 00:00 before the timer returns to idle.
pub const DEFAULT_COMPLETION_HOLD: Duration = Duration::from_millis(1500);

/// Default session length: 25 minutes.
pub const DEFAULT_DURATION_SECS: u32 = 25 * 60;

/// Inclusive bounds for a session duration, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationLimits {
    pub min_secs: u32,
    pub max_secs: u32,
}

impl DurationLimits {
    pub const fn new(min_secs: u32, max_secs: u32) -> Self {
        Self { min_secs, max_secs }
    }

    /// Build limits from whole minutes. Uses saturating arithmetic.
    pub fn from_minutes(min_minutes: u32, max_minutes: u32) -> Self {
        Self {
            min_secs: min_minutes.saturating_mul(60),
            max_secs: max_minutes.saturating_mul(60),
        }
    }

    pub fn contains(&self, secs: u32) -> bool {
        secs >= 1 && (self.min_secs..=self.max_secs).contains(&secs)
    }

    /// Validate a duration, returning it unchanged when it is in range.
    ///
    /// # Errors
    /// Returns [`TimerError::InvalidDuration`] for zero or out-of-range values.
    pub fn check(&self, secs: u32) -> Result<u32, TimerError> {
        if self.contains(secs) {
            Ok(secs)
        } else {
            Err(TimerError::InvalidDuration {
                secs,
                min: self.min_secs,
                max: self.max_secs,
            })
        }
    }
}

impl Default for DurationLimits {
    /// One to 120 minutes.
    fn default() -> Self {
        Self::from_minutes(1, 120)
    }
}

/// What happens to the countdown when the duration changes while paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PausedResize {
    /// Go back to the full new duration and become idle.
    #[default]
    Rebase,
    /// Keep the elapsed seconds and stay paused.
    PreserveElapsed,
}

/// Tunables for [`super::TimerEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerOptions {
    pub limits: DurationLimits,
    pub completion_hold: Duration,
    pub paused_resize: PausedResize,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            limits: DurationLimits::default(),
            completion_hold: DEFAULT_COMPLETION_HOLD,
            paused_resize: PausedResize::default(),
        }
    }
}

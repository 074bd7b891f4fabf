use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::records::SessionRecord;

/// Every state change in the system produces an Event.
/// The presentation layer renders from snapshots and uses events for
/// one-off feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        nickname: String,
        duration_secs: u32,
        remaining_secs: u32,
        /// True when the session continues from a pause.
        resumed: bool,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    DurationConfigured {
        duration_secs: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero. Fires exactly once per session.
    TimerCompleted {
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    /// Display hold after completion ran out; the timer is idle again.
    CompletionHoldElapsed {
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    /// A completed session was written to the record store.
    SessionRecorded {
        nickname: String,
        record: SessionRecord,
        at: DateTime<Utc>,
    },
    NicknameChanged {
        nickname: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_completion(&self) -> bool {
        matches!(self, Event::TimerCompleted { .. })
    }
}

//! Application facade.
//!
//! [`FocusApp`] wires the timer engine, identity, record store, task queue,
//! persistent store and notifier together. The presentation layer calls the
//! command methods, drives time with [`FocusApp::advance`] (or lets
//! [`crate::runtime::drive`] do it) and renders [`FocusApp::snapshot`].

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::error::{Result, TimerError};
use crate::events::Event;
use crate::identity::Identity;
use crate::notify::{Notification, Notifier, Severity};
use crate::records::{CompletedSession, RecordLimits, RecordMode, Records, SessionRecordStore};
use crate::storage::kv::{get_or_none, KeyValueStore, DURATION_KEY};
use crate::storage::Config;
use crate::timer::{TaskQueue, TimerEngine, TimerOptions, TimerStatus};

/// Everything [`FocusApp`] needs from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub timer: TimerOptions,
    /// Used when no valid duration has been persisted.
    pub default_duration_secs: u32,
    pub record_mode: RecordMode,
    pub record_limits: RecordLimits,
    pub points_award: u64,
    pub completion_toast_ms: u64,
    pub error_toast_ms: u64,
}

impl From<&Config> for AppSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            timer: cfg.timer_options(),
            default_duration_secs: cfg.default_duration_secs(),
            record_mode: cfg.records.mode,
            record_limits: cfg.record_limits(),
            points_award: cfg.records.points_award,
            completion_toast_ms: cfg.notifications.completion_duration_ms,
            error_toast_ms: cfg.notifications.error_duration_ms,
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Read-only view of the application for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub status: TimerStatus,
    pub remaining_secs: u32,
    pub duration_secs: u32,
    pub nickname: String,
    pub records: Records,
    /// Remaining time as `MM:SS`.
    pub clock: String,
    pub progress_pct: f64,
    /// Message shown after a completed session until the next start or reset.
    pub banner: Option<String>,
}

pub struct FocusApp<S, N> {
    settings: AppSettings,
    engine: TimerEngine,
    tasks: TaskQueue,
    identity: Identity,
    records: SessionRecordStore,
    store: S,
    notifier: N,
    banner: Option<String>,
    /// Nickname that started the current session; credited on completion.
    /// Kept across pause and resume, cleared when the countdown is re-based.
    session_owner: Option<String>,
}

impl<S: KeyValueStore, N: Notifier> FocusApp<S, N> {
    /// Restore identity, duration and records from `store`.
    pub fn open(settings: AppSettings, store: S, notifier: N) -> Self {
        let identity = Identity::load(&store);
        let duration_secs = load_duration(&store, &settings);
        let engine = TimerEngine::new(duration_secs, settings.timer);
        let records = SessionRecordStore::load(
            settings.record_mode,
            settings.record_limits,
            &identity,
            &store,
        );
        tracing::debug!(
            nickname = %identity,
            duration_secs,
            mode = ?settings.record_mode,
            records = records.records().len(),
            "focus app opened"
        );

        Self {
            settings,
            engine,
            tasks: TaskQueue::new(),
            identity,
            records,
            store,
            notifier,
            banner: None,
            session_owner: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn records(&self) -> &SessionRecordStore {
        &self.records
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.tasks.now()
    }

    /// Virtual instant of the next scheduled task, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.tasks.next_due()
    }

    pub fn snapshot(&self) -> Snapshot {
        let remaining_secs = self.engine.remaining_secs();
        Snapshot {
            status: self.engine.status(),
            remaining_secs,
            duration_secs: self.engine.duration_secs(),
            nickname: self.identity.nickname().to_string(),
            records: self.records.records().clone(),
            clock: format_clock(remaining_secs),
            progress_pct: self.engine.progress() * 100.0,
            banner: self.banner.clone(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Change the session length and persist it.
    ///
    /// # Errors
    /// Timer rejections leave everything unchanged. A failed write is
    /// returned after the new duration has taken effect in memory.
    pub fn configure(&mut self, duration_secs: u32) -> Result<Event> {
        let event = match self.engine.configure(duration_secs, &mut self.tasks) {
            Ok(event) => event,
            Err(e) => {
                self.report(&e);
                return Err(e.into());
            }
        };
        self.banner = None;
        if self.engine.status() == TimerStatus::Idle {
            self.session_owner = None;
        }
        if let Err(e) = self.store.set(DURATION_KEY, &duration_secs.to_string()) {
            tracing::error!(error = %e, "failed to persist duration");
            return Err(e.into());
        }
        Ok(event)
    }

    /// [`FocusApp::configure`] in whole minutes.
    ///
    /// # Errors
    /// See [`FocusApp::configure`].
    pub fn configure_minutes(&mut self, minutes: u32) -> Result<Event> {
        self.configure(minutes.saturating_mul(60))
    }

    /// Start or resume a session for the current identity.
    ///
    /// # Errors
    /// Returns the timer's rejection; identity and duration problems are
    /// also sent to the notifier.
    pub fn start(&mut self) -> Result<Event> {
        let event = match self.engine.start(&self.identity, &mut self.tasks) {
            Ok(event) => event,
            Err(e) => {
                self.report(&e);
                return Err(e.into());
            }
        };
        self.banner = None;
        let resumed = matches!(event, Event::TimerStarted { resumed: true, .. });
        if !resumed || self.session_owner.is_none() {
            self.session_owner = Some(self.identity.nickname().to_string());
        }
        Ok(event)
    }

    /// # Errors
    /// Returns the timer's rejection when not running.
    pub fn pause(&mut self) -> Result<Event> {
        Ok(self.engine.pause(&mut self.tasks)?)
    }

    /// # Errors
    /// Returns the timer's rejection while running.
    pub fn reset(&mut self) -> Result<Event> {
        let event = self.engine.reset(&mut self.tasks)?;
        self.banner = None;
        self.session_owner = None;
        Ok(event)
    }

    /// Replace the nickname, persist it and switch history if needed.
    ///
    /// # Errors
    /// Returns an error if the nickname cannot be persisted; the previous
    /// identity stays active in that case.
    pub fn set_nickname(&mut self, nickname: impl Into<String>) -> Result<Event> {
        let identity = Identity::new(nickname);
        identity.save(&mut self.store)?;
        self.records.switch_identity(&identity, &self.store);
        tracing::info!(nickname = %identity, "nickname changed");
        self.identity = identity;

        Ok(Event::NicknameChanged {
            nickname: self.identity.nickname().to_string(),
            at: Utc::now(),
        })
    }

    /// Move virtual time forward by `by`, firing every task that falls due.
    pub fn advance(&mut self, by: Duration) -> Vec<Event> {
        let until = self.tasks.now() + by;
        self.advance_to(until)
    }

    /// Fire every task due at or before `until`, one at a time, then move the
    /// clock to `until`.
    pub fn advance_to(&mut self, until: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(handle) = self.tasks.pop_due(until) {
            let Some(event) = self.engine.on_task(handle, &mut self.tasks) else {
                continue;
            };
            let completed = event.is_completion();
            events.push(event);
            if completed {
                events.extend(self.complete());
            }
        }
        self.tasks.set_now(until);
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Option<Event> {
        let nickname = self
            .session_owner
            .take()
            .unwrap_or_else(|| self.identity.nickname().to_string());
        let session = CompletedSession {
            nickname,
            duration_secs: self.engine.duration_secs(),
            points_award: self.settings.points_award,
            completed_at: Utc::now(),
        };

        let message = match self.settings.record_mode {
            RecordMode::Leaderboard => {
                format!("Great job! You earned {} points.", session.points_award)
            }
            RecordMode::History => format!(
                "Great job! You completed a {}-minute focus session.",
                session.duration_minutes()
            ),
        };
        self.notifier.notify(Notification {
            title: "Session Complete!".into(),
            message: message.clone(),
            severity: Severity::Success,
            duration_ms: self.settings.completion_toast_ms,
        });
        self.banner = Some(message);

        match self.records.record_completion(&session, &mut self.store) {
            Ok(record) => {
                tracing::info!(nickname = %session.nickname, "session recorded");
                Some(Event::SessionRecorded {
                    nickname: session.nickname,
                    record,
                    at: session.completed_at,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, nickname = %session.nickname, "failed to persist session");
                None
            }
        }
    }

    fn report(&mut self, err: &TimerError) {
        let (title, message) = match err {
            TimerError::IdentityRequired => (
                "Nickname Required",
                "Please enter a nickname before starting.".to_string(),
            ),
            TimerError::InvalidDuration { min, max, .. } => (
                "Invalid Duration",
                format!(
                    "Choose a duration between {} and {} minutes.",
                    min / 60,
                    max / 60
                ),
            ),
            TimerError::NotAllowed { .. } => return,
        };
        self.notifier.notify(Notification {
            title: title.into(),
            message,
            severity: Severity::Error,
            duration_ms: self.settings.error_toast_ms,
        });
    }
}

/// Persisted duration, or the configured default when missing or invalid.
fn load_duration(store: &dyn KeyValueStore, settings: &AppSettings) -> u32 {
    let Some(raw) = get_or_none(store, DURATION_KEY) else {
        return settings.default_duration_secs;
    };
    match raw.trim().parse::<u32>() {
        Ok(secs) if settings.timer.limits.contains(secs) => secs,
        _ => {
            tracing::warn!(value = %raw, "ignoring invalid persisted duration");
            settings.default_duration_secs
        }
    }
}

/// Format seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

//! # FocusFlow Core Library
//!
//! Core logic for the FocusFlow focus timer. All behavior lives here; the
//! `focusflow` CLI is a thin terminal layer over the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a countdown state machine driven by a virtual-time
//!   task queue, so every transition can be replayed deterministically
//! - **Records**: leaderboard or per-nickname history, persisted as JSON
//! - **Storage**: key-value persistence (SQLite or in-memory) and TOML
//!   configuration
//! - **Runtime**: a tokio driver that maps virtual time onto real time
//!
//! ## Key Components
//!
//! - [`FocusApp`]: facade combining timer, identity, records and storage
//! - [`TimerEngine`]: core timer state machine
//! - [`SessionRecordStore`]: completed-session bookkeeping
//! - [`Database`]: SQLite-backed [`KeyValueStore`]
//! - [`Config`]: application configuration management

pub mod app;
pub mod error;
pub mod events;
pub mod identity;
pub mod notify;
pub mod records;
pub mod runtime;
pub mod storage;
pub mod timer;

pub use app::{format_clock, AppSettings, FocusApp, Snapshot};
pub use error::{ConfigError, CoreError, Result, StoreError, TimerError};
pub use events::Event;
pub use identity::Identity;
pub use notify::{Gated, LogNotifier, MemoryNotifier, Notification, Notifier, Severity};
pub use records::{
    CompletedSession, HistoryEntry, LeaderboardEntry, LeaderboardRow, RecordLimits, RecordMode,
    Records, SessionRecord, SessionRecordStore,
};
pub use runtime::{drive, Command, Update};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use timer::{
    DurationLimits, PausedResize, TaskHandle, TaskKind, TaskQueue, TimerEngine, TimerOptions,
    TimerState, TimerStatus,
};

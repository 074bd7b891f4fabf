//! Session record store.
//!
//! Completed sessions are kept in one of two shapes, chosen by
//! configuration:
//!
//! - **Leaderboard**: one entry per nickname with accumulated points, sorted
//!   by points (highest first) and truncated to the top entries. Global,
//!   stored under [`LEADERBOARD_KEY`].
//! - **History**: one entry per completed session, most recent first,
//!   truncated to the newest entries. Stored per nickname under
//!   [`history_key`].
//!
//! The full collection is written back after every mutation. Malformed JSON
//! on load is logged and treated as an empty collection.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::identity::Identity;
use crate::storage::kv::{get_or_none, history_key, KeyValueStore, LEADERBOARD_KEY};

/// Default number of leaderboard entries kept.
pub const LEADERBOARD_SIZE: usize = 10;

/// Default number of history entries kept per nickname.
pub const HISTORY_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordMode {
    #[default]
    Leaderboard,
    History,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub nickname: String,
    pub points: u64,
    /// When the current point total was reached. Absent for entries
    /// written before the field existed; those rank first among ties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achieved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub duration_minutes: u32,
    pub completed_at: DateTime<Utc>,
}

/// One record, in either shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SessionRecord {
    Leaderboard(LeaderboardEntry),
    History(HistoryEntry),
}

/// The active collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "entries", rename_all = "lowercase")]
pub enum Records {
    Leaderboard(Vec<LeaderboardEntry>),
    History(Vec<HistoryEntry>),
}

impl Records {
    pub fn len(&self) -> usize {
        match self {
            Records::Leaderboard(entries) => entries.len(),
            Records::History(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mode(&self) -> RecordMode {
        match self {
            Records::Leaderboard(_) => RecordMode::Leaderboard,
            Records::History(_) => RecordMode::History,
        }
    }
}

/// Caps applied after every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLimits {
    pub leaderboard_size: usize,
    pub history_size: usize,
}

impl Default for RecordLimits {
    fn default() -> Self {
        Self {
            leaderboard_size: LEADERBOARD_SIZE,
            history_size: HISTORY_SIZE,
        }
    }
}

/// A finished session, as handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSession {
    pub nickname: String,
    pub duration_secs: u32,
    pub points_award: u64,
    pub completed_at: DateTime<Utc>,
}

impl CompletedSession {
    /// Whole minutes, rounded up, never below one.
    pub fn duration_minutes(&self) -> u32 {
        self.duration_secs.div_ceil(60).max(1)
    }
}

/// A leaderboard line ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub nickname: String,
    pub points: u64,
    pub is_current: bool,
}

/// Record collection for the active identity.
#[derive(Debug, Clone)]
pub struct SessionRecordStore {
    limits: RecordLimits,
    /// Nickname whose history is loaded. Unused in leaderboard mode.
    owner: String,
    records: Records,
}

impl SessionRecordStore {
    /// Load the collection for `mode`. History mode loads `identity`'s log.
    pub fn load(
        mode: RecordMode,
        limits: RecordLimits,
        identity: &Identity,
        store: &dyn KeyValueStore,
    ) -> Self {
        let records = match mode {
            RecordMode::Leaderboard => {
                let mut entries: Vec<LeaderboardEntry> = load_json(store, LEADERBOARD_KEY);
                sort_leaderboard(&mut entries);
                entries.truncate(limits.leaderboard_size);
                Records::Leaderboard(entries)
            }
            RecordMode::History => {
                let mut entries: Vec<HistoryEntry> =
                    load_json(store, &history_key(identity.nickname()));
                entries.truncate(limits.history_size);
                Records::History(entries)
            }
        };
        Self {
            limits,
            owner: identity.nickname().to_string(),
            records,
        }
    }

    pub fn mode(&self) -> RecordMode {
        self.records.mode()
    }

    pub fn records(&self) -> &Records {
        &self.records
    }

    pub fn limits(&self) -> RecordLimits {
        self.limits
    }

    /// Key the active collection is persisted under.
    pub fn storage_key(&self) -> String {
        match self.records {
            Records::Leaderboard(_) => LEADERBOARD_KEY.to_string(),
            Records::History(_) => history_key(&self.owner),
        }
    }

    /// Follow an identity change. History mode switches to the new
    /// nickname's log; the leaderboard is global and stays as is.
    pub fn switch_identity(&mut self, identity: &Identity, store: &dyn KeyValueStore) {
        if let Records::History(entries) = &mut self.records {
            self.owner = identity.nickname().to_string();
            *entries = load_json(store, &history_key(&self.owner));
            entries.truncate(self.limits.history_size);
            tracing::debug!(owner = %self.owner, entries = entries.len(), "history reloaded");
        }
    }

    /// Add a completed session and persist the affected collection.
    ///
    /// The in-memory collection is updated even if the write fails.
    /// History for a nickname other than the active one is updated in the
    /// store only.
    ///
    /// # Errors
    /// Returns an error if the collection cannot be written.
    pub fn record_completion(
        &mut self,
        session: &CompletedSession,
        store: &mut dyn KeyValueStore,
    ) -> Result<SessionRecord, StoreError> {
        match &mut self.records {
            Records::Leaderboard(entries) => {
                let entry = add_points(
                    entries,
                    &session.nickname,
                    session.points_award,
                    session.completed_at,
                    self.limits.leaderboard_size,
                );
                save_json(store, LEADERBOARD_KEY, &entries[..])?;
                Ok(SessionRecord::Leaderboard(entry))
            }
            Records::History(entries) => {
                let entry = HistoryEntry {
                    duration_minutes: session.duration_minutes(),
                    completed_at: session.completed_at,
                };
                let key = history_key(&session.nickname);
                if session.nickname == self.owner {
                    push_history(entries, entry.clone(), self.limits.history_size);
                    save_json(store, &key, &entries[..])?;
                } else {
                    let mut other: Vec<HistoryEntry> = load_json(&*store, &key);
                    push_history(&mut other, entry.clone(), self.limits.history_size);
                    save_json(store, &key, &other)?;
                }
                Ok(SessionRecord::History(entry))
            }
        }
    }

    /// Write the active collection as it is.
    ///
    /// # Errors
    /// Returns an error if the collection cannot be written.
    pub fn persist(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        match &self.records {
            Records::Leaderboard(entries) => save_json(store, LEADERBOARD_KEY, entries),
            Records::History(entries) => save_json(store, &history_key(&self.owner), entries),
        }
    }

    /// Ranked leaderboard rows, flagging the current identity. Empty in
    /// history mode.
    pub fn leaderboard_rows(&self, identity: &Identity) -> Vec<LeaderboardRow> {
        match &self.records {
            Records::Leaderboard(entries) => entries
                .iter()
                .enumerate()
                .map(|(i, e)| LeaderboardRow {
                    rank: i + 1,
                    nickname: e.nickname.clone(),
                    points: e.points,
                    is_current: !identity.is_empty() && e.nickname == identity.nickname(),
                })
                .collect(),
            Records::History(_) => Vec::new(),
        }
    }
}

/// Credit `award` points to `nickname`, then sort and truncate.
///
/// Returns the updated entry as it was before truncation.
pub fn add_points(
    entries: &mut Vec<LeaderboardEntry>,
    nickname: &str,
    award: u64,
    at: DateTime<Utc>,
    cap: usize,
) -> LeaderboardEntry {
    let entry = match entries.iter_mut().find(|e| e.nickname == nickname) {
        Some(existing) => {
            existing.points = existing.points.saturating_add(award);
            existing.achieved_at = Some(at);
            existing.clone()
        }
        None => {
            let entry = LeaderboardEntry {
                nickname: nickname.to_string(),
                points: award,
                achieved_at: Some(at),
            };
            entries.push(entry.clone());
            entry
        }
    };
    sort_leaderboard(entries);
    entries.truncate(cap);
    entry
}

/// Highest points first; ties go to whoever reached the total first, then
/// by nickname.
pub fn sort_leaderboard(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(leaderboard_order);
}

fn leaderboard_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| a.achieved_at.cmp(&b.achieved_at))
        .then_with(|| a.nickname.cmp(&b.nickname))
}

/// Prepend `entry` and keep the newest `cap` entries.
pub fn push_history(entries: &mut Vec<HistoryEntry>, entry: HistoryEntry, cap: usize) {
    entries.insert(0, entry);
    entries.truncate(cap);
}

fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    let Some(raw) = get_or_none(store, key) else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(key, error = %e, "malformed persisted records; starting empty");
            Vec::new()
        }
    }
}

fn save_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    entries: &[T],
) -> Result<(), StoreError> {
    let json = serde_json::to_string(entries)?;
    store.set(key, &json)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::storage::MemoryStore;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    fn session(nickname: &str, at: DateTime<Utc>) -> CompletedSession {
        CompletedSession {
            nickname: nickname.to_string(),
            duration_secs: 1500,
            points_award: 25,
            completed_at: at,
        }
    }

    fn leaderboard(store: &MemoryStore) -> SessionRecordStore {
        SessionRecordStore::load(
            RecordMode::Leaderboard,
            RecordLimits::default(),
            &Identity::new("alice"),
            store,
        )
    }

    #[test]
    fn repeat_completions_accumulate_on_one_entry() {
        let mut store = MemoryStore::new();
        let mut records = leaderboard(&store);
        records.record_completion(&session("alice", t(0)), &mut store).unwrap();
        records.record_completion(&session("alice", t(10)), &mut store).unwrap();

        let Records::Leaderboard(entries) = records.records() else {
            panic!("expected leaderboard");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].nickname, "alice");
        assert_eq!(entries[0].points, 50);
    }

    #[test]
    fn leaderboard_sorted_and_capped() {
        let mut entries = Vec::new();
        for i in 0..12u64 {
            add_points(&mut entries, &format!("user{i}"), 10 + i, t(i as i64), 10);
        }
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].nickname, "user11");
        assert!(entries.windows(2).all(|w| w[0].points >= w[1].points));
        assert!(entries.iter().all(|e| e.nickname != "user0" && e.nickname != "user1"));
    }

    #[test]
    fn ties_go_to_earliest_achiever() {
        let mut entries = Vec::new();
        add_points(&mut entries, "bob", 25, t(0), 10);
        add_points(&mut entries, "alice", 25, t(5), 10);
        assert_eq!(entries[0].nickname, "bob");

        // Legacy entries without a timestamp rank ahead of timed ties.
        entries.push(LeaderboardEntry {
            nickname: "zed".into(),
            points: 25,
            achieved_at: None,
        });
        sort_leaderboard(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.nickname.as_str()).collect();
        assert_eq!(names, ["zed", "bob", "alice"]);
    }

    #[test]
    fn legacy_leaderboard_json_loads_sorted() {
        let mut store = MemoryStore::new();
        store
            .set(
                LEADERBOARD_KEY,
                r#"[{"nickname":"a","points":25},{"nickname":"b","points":75}]"#,
            )
            .unwrap();
        let records = leaderboard(&store);
        let Records::Leaderboard(entries) = records.records() else {
            panic!("expected leaderboard");
        };
        assert_eq!(entries[0].nickname, "b");
        assert_eq!(entries[0].achieved_at, None);
    }

    #[test]
    fn oversized_collections_are_capped_on_load() {
        let mut store = MemoryStore::new();
        let board: Vec<_> = (0..15u64)
            .map(|i| LeaderboardEntry {
                nickname: format!("user{i:02}"),
                points: 25 * (i + 1),
                achieved_at: None,
            })
            .collect();
        store
            .set(LEADERBOARD_KEY, &serde_json::to_string(&board).unwrap())
            .unwrap();
        let history: Vec<_> = (0..25)
            .map(|i| HistoryEntry {
                duration_minutes: 25,
                completed_at: t(1000 - i),
            })
            .collect();
        store
            .set("history:alice", &serde_json::to_string(&history).unwrap())
            .unwrap();

        let records = leaderboard(&store);
        let Records::Leaderboard(entries) = records.records() else {
            panic!("expected leaderboard");
        };
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].nickname, "user14");
        assert_eq!(entries[9].nickname, "user05");

        let history = SessionRecordStore::load(
            RecordMode::History,
            RecordLimits::default(),
            &Identity::new("alice"),
            &store,
        );
        assert_eq!(history.records().len(), 20);
    }

    #[test]
    fn malformed_json_loads_empty() {
        let mut store = MemoryStore::new();
        store.set(LEADERBOARD_KEY, "{not json").unwrap();
        store.set("history:alice", "[{\"durationMinutes\":").unwrap();

        assert!(leaderboard(&store).records().is_empty());
        let history = SessionRecordStore::load(
            RecordMode::History,
            RecordLimits::default(),
            &Identity::new("alice"),
            &store,
        );
        assert!(history.records().is_empty());
    }

    #[test]
    fn history_keeps_newest_twenty() {
        let mut store = MemoryStore::new();
        let alice = Identity::new("alice");
        let mut records =
            SessionRecordStore::load(RecordMode::History, RecordLimits::default(), &alice, &store);
        for i in 0..25 {
            records.record_completion(&session("alice", t(i)), &mut store).unwrap();
        }

        let Records::History(entries) = records.records() else {
            panic!("expected history");
        };
        assert_eq!(entries.len(), 20);
        assert_eq!(entries[0].completed_at, t(24));
        assert_eq!(entries[19].completed_at, t(5));
        assert_eq!(entries[0].duration_minutes, 25);
    }

    #[test]
    fn history_switches_with_identity() {
        let mut store = MemoryStore::new();
        let mut records = SessionRecordStore::load(
            RecordMode::History,
            RecordLimits::default(),
            &Identity::new("alice"),
            &store,
        );
        records.record_completion(&session("alice", t(0)), &mut store).unwrap();

        records.switch_identity(&Identity::new("bob"), &store);
        assert!(records.records().is_empty());
        assert_eq!(records.storage_key(), "history:bob");

        records.switch_identity(&Identity::new("alice"), &store);
        assert_eq!(records.records().len(), 1);
    }

    #[test]
    fn history_for_other_nickname_goes_to_its_own_key() {
        let mut store = MemoryStore::new();
        let mut records = SessionRecordStore::load(
            RecordMode::History,
            RecordLimits::default(),
            &Identity::new("bob"),
            &store,
        );
        records.record_completion(&session("alice", t(0)), &mut store).unwrap();

        assert!(records.records().is_empty());
        let raw = store.get("history:alice").unwrap().unwrap();
        let saved: Vec<HistoryEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(saved.len(), 1);
    }

    #[test]
    fn leaderboard_ignores_identity_switch() {
        let mut store = MemoryStore::new();
        let mut records = leaderboard(&store);
        records.record_completion(&session("alice", t(0)), &mut store).unwrap();
        records.switch_identity(&Identity::new("bob"), &store);
        assert_eq!(records.records().len(), 1);
    }

    #[test]
    fn persisted_collection_reloads_identically() {
        let mut store = MemoryStore::new();
        let mut records = leaderboard(&store);
        for (i, name) in ["carol", "alice", "bob", "alice"].iter().enumerate() {
            records.record_completion(&session(name, t(i as i64)), &mut store).unwrap();
        }
        records.persist(&mut store).unwrap();

        let reloaded = leaderboard(&store);
        assert_eq!(reloaded.records(), records.records());
    }

    #[test]
    fn rows_flag_current_identity() {
        let mut store = MemoryStore::new();
        let mut records = leaderboard(&store);
        records.record_completion(&session("bob", t(0)), &mut store).unwrap();
        records.record_completion(&session("alice", t(1)), &mut store).unwrap();
        records.record_completion(&session("alice", t(2)), &mut store).unwrap();

        let rows = records.leaderboard_rows(&Identity::new("alice"));
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].nickname, "alice");
        assert!(rows[0].is_current);
        assert!(!rows[1].is_current);
    }

    #[test]
    fn history_entry_uses_camel_case_json() {
        let entry = HistoryEntry {
            duration_minutes: 25,
            completed_at: t(0),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["durationMinutes"], 25);
        assert!(json.get("completedAt").is_some());
    }

    #[test]
    fn duration_minutes_rounds_up() {
        let mut s = session("alice", t(0));
        s.duration_secs = 90;
        assert_eq!(s.duration_minutes(), 2);
        s.duration_secs = 1;
        assert_eq!(s.duration_minutes(), 1);
    }
}

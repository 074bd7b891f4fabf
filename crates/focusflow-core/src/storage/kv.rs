//! Key-value store adapter.
//!
//! Everything FocusFlow persists (nickname, duration, session records) is a
//! string value under a string key, the same contract a browser's local
//! storage offers. [`MemoryStore`] keeps values in process;
//! [`super::Database`] keeps them in SQLite.

use std::collections::HashMap;

use crate::error::StoreError;

/// Key holding the current nickname.
pub const NICKNAME_KEY: &str = "focusFlowNickname";

/// Key holding the global leaderboard.
pub const LEADERBOARD_KEY: &str = "focusFlowLeaderboard";

/// Key holding the configured session duration, in seconds.
pub const DURATION_KEY: &str = "focusFlowDuration";

/// Key holding the completion history for one nickname.
pub fn history_key(nickname: &str) -> String {
    format!("history:{nickname}")
}

/// Synchronous string key-value storage scoped to one profile.
pub trait KeyValueStore {
    /// # Errors
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-process store backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Read a key, logging and swallowing read failures.
///
/// Callers that can fall back to an empty value use this so a broken
/// store never stops the timer.
pub(crate) fn get_or_none(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read persisted value; treating as absent");
            None
        }
    }
}

//! The user's nickname.
//!
//! The nickname scopes session records. It may be empty; an empty identity
//! cannot start a session.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::storage::kv::{get_or_none, KeyValueStore, NICKNAME_KEY};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity {
    nickname: String,
}

impl Identity {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
        }
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn is_empty(&self) -> bool {
        self.nickname.is_empty()
    }

    /// Load the persisted nickname. A missing or unreadable value yields the
    /// empty identity.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self::new(get_or_none(store, NICKNAME_KEY).unwrap_or_default())
    }

    /// Persist the raw nickname, including the empty string.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        store.set(NICKNAME_KEY, &self.nickname)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.nickname)
    }
}

//! Match persistence backends

pub mod matches;
pub mod memory;
pub mod supabase;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::matches::model::{MatchRecord, SetRecord};
use crate::scoring::{MatchState, ScoreError};

pub use matches::SupabaseMatchStore;
pub use memory::MemoryMatchStore;
pub use supabase::{SupabaseClient, SupabaseError};

/// Match repository, one of the supported backends
#[derive(Clone)]
pub enum MatchStore {
    Supabase(SupabaseMatchStore),
    Memory(MemoryMatchStore),
}

impl MatchStore {
    pub fn backend(&self) -> &'static str {
        match self {
            MatchStore::Supabase(_) => "supabase",
            MatchStore::Memory(_) => "memory",
        }
    }

    pub async fn create(&self, record: &MatchRecord) -> Result<MatchRecord, StoreError> {
        match self {
            MatchStore::Supabase(store) => store.create(record).await,
            MatchStore::Memory(store) => store.create(record),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<MatchRecord>, StoreError> {
        match self {
            MatchStore::Supabase(store) => store.get(id).await,
            MatchStore::Memory(store) => store.get(id),
        }
    }

    /// All matches, newest first
    pub async fn list(&self) -> Result<Vec<MatchRecord>, StoreError> {
        match self {
            MatchStore::Supabase(store) => store.list().await,
            MatchStore::Memory(store) => store.list(),
        }
    }

    /// Completed matches created in `[from, to)`, oldest first
    pub async fn list_completed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        match self {
            MatchStore::Supabase(store) => store.list_completed_between(from, to).await,
            MatchStore::Memory(store) => store.list_completed_between(from, to),
        }
    }

    /// Persist `state` if the match is still at `expected_version`
    pub async fn commit(
        &self,
        id: Uuid,
        expected_version: i64,
        state: &MatchState,
        new_set: Option<SetRecord>,
    ) -> Result<MatchRecord, StoreError> {
        match self {
            MatchStore::Supabase(store) => store.commit(id, expected_version, state, new_set).await,
            MatchStore::Memory(store) => store.commit(id, expected_version, state, new_set),
        }
    }
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Supabase(#[from] SupabaseError),

    #[error("Match {id} changed since version {expected}")]
    VersionConflict { id: Uuid, expected: i64 },

    #[error("Match {id} has an invalid stored score: {source}")]
    InvalidRow {
        id: Uuid,
        #[source]
        source: ScoreError,
    },

    #[error("Match {0} not found")]
    NotFound(Uuid),
}

//! In-process match store used for local development and tests

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::matches::model::{MatchRecord, SetRecord};
use crate::scoring::{MatchState, ScoreError};

use super::StoreError;

#[derive(Clone, Default)]
pub struct MemoryMatchStore {
    matches: Arc<RwLock<HashMap<Uuid, MatchRecord>>>,
}

impl MemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, record: &MatchRecord) -> Result<MatchRecord, StoreError> {
        self.matches.write().insert(record.id, record.clone());
        Ok(record.clone())
    }

    pub fn get(&self, id: Uuid) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self.matches.read().get(&id).cloned())
    }

    pub fn list(&self) -> Result<Vec<MatchRecord>, StoreError> {
        let mut records: Vec<MatchRecord> = self.matches.read().values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    pub fn list_completed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let mut records: Vec<MatchRecord> = self
            .matches
            .read()
            .values()
            .filter(|m| m.state.is_complete && m.created_at >= from && m.created_at < to)
            .cloned()
            .collect();
        records.sort_by_key(|m| m.created_at);
        Ok(records)
    }

    /// Compare-and-swap on `version`. The snapshot already carries the set
    /// history; a `new_set` that disagrees with it is rejected.
    pub fn commit(
        &self,
        id: Uuid,
        expected_version: i64,
        state: &MatchState,
        new_set: Option<SetRecord>,
    ) -> Result<MatchRecord, StoreError> {
        let mut matches = self.matches.write();
        let record = matches.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if record.version != expected_version {
            return Err(StoreError::VersionConflict {
                id,
                expected: expected_version,
            });
        }

        if let Some(set) = new_set {
            let recorded = state.completed_sets.get(set.set_number as usize);
            if recorded != Some(&set.score()) {
                return Err(StoreError::InvalidRow {
                    id,
                    source: ScoreError::invalid(format!(
                        "set {} row {} disagrees with the match snapshot",
                        set.set_number,
                        set.score()
                    )),
                });
            }
        }

        record.state = state.clone();
        record.version += 1;
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{apply_point, Player};
    use chrono::Duration;

    fn record(created_at: DateTime<Utc>) -> MatchRecord {
        let mut record = MatchRecord::new(Uuid::new_v4(), "Ana".into(), "Bea".into(), Player::Player1);
        record.created_at = created_at;
        record
    }

    #[test]
    fn commit_is_compare_and_swap() {
        let store = MemoryMatchStore::new();
        let created = store.create(&record(Utc::now())).unwrap();
        let next = apply_point(&created.state, Player::Player1).unwrap();

        let committed = store.commit(created.id, 0, &next, None).unwrap();
        assert_eq!(committed.version, 1);
        assert_eq!(committed.state, next);

        // Stale writer loses and the stored state is untouched
        let stale = apply_point(&created.state, Player::Player2).unwrap();
        let err = store.commit(created.id, 0, &stale, None).unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { expected: 0, .. }));
        assert_eq!(store.get(created.id).unwrap().unwrap().state, next);
    }

    #[test]
    fn commit_unknown_match() {
        let store = MemoryMatchStore::new();
        let state = MatchState::new(Player::Player1);
        let id = Uuid::new_v4();
        assert!(matches!(store.commit(id, 0, &state, None), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn commit_rejects_set_row_missing_from_snapshot() {
        let store = MemoryMatchStore::new();
        let created = store.create(&record(Utc::now())).unwrap();
        let next = apply_point(&created.state, Player::Player1).unwrap();
        let stray = SetRecord::new(created.id, 0, crate::scoring::SetScore::new(6, 4));

        let err = store.commit(created.id, 0, &next, Some(stray)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRow { .. }));
        assert_eq!(store.get(created.id).unwrap().unwrap(), created);
    }

    #[test]
    fn completed_window_is_half_open_and_ascending() {
        let store = MemoryMatchStore::new();
        let start = Utc::now() - Duration::days(1);
        let end = start + Duration::days(1);

        let mut ids = Vec::new();
        for offset in [Duration::hours(5), Duration::zero(), Duration::days(1), Duration::hours(2)] {
            let mut r = record(start + offset);
            r.state.completed_sets = vec![
                crate::scoring::SetScore::new(6, 0),
                crate::scoring::SetScore::new(6, 0),
            ];
            r.state.current_set = 2;
            r.state.is_complete = true;
            ids.push(r.id);
            store.create(&r).unwrap();
        }
        // Incomplete matches are never included
        store.create(&record(start + Duration::hours(1))).unwrap();

        let found: Vec<Uuid> = store
            .list_completed_between(start, end)
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(found, vec![ids[1], ids[3], ids[0]]);
    }
}

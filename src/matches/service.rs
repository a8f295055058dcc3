//! Match service - creation, reads and the serialized scoring write path

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::scoring::{
    apply_point, classify, closed_set, MatchState, Player, PointOutcome, ScoreError,
};
use crate::store::{MatchStore, StoreError};

use super::model::{MatchRecord, ServerChoice, SetRecord};

/// Match service errors
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("Match {0} not found")]
    NotFound(Uuid),

    #[error("Only the match creator can update scores")]
    Forbidden,

    #[error("Match {0} was updated concurrently, refresh and try again")]
    Conflict(Uuid),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for MatchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { id, .. } => MatchError::Conflict(id),
            StoreError::NotFound(id) => MatchError::NotFound(id),
            StoreError::InvalidRow { source, .. } => MatchError::Score(source),
            other => MatchError::Store(other),
        }
    }
}

/// Owns the write path for every match. Scoring a match holds that match's
/// lock for the whole read-apply-commit cycle; the store's version check
/// covers writers in other processes.
pub struct MatchService {
    store: MatchStore,
    write_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl MatchService {
    pub fn new(store: MatchStore) -> Self {
        Self {
            store,
            write_locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &MatchStore {
        &self.store
    }

    fn write_lock(&self, id: Uuid) -> WriteLock<'_> {
        let lock = self
            .write_locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        WriteLock {
            locks: &self.write_locks,
            id,
            lock,
        }
    }

    pub async fn create_match(
        &self,
        creator: Uuid,
        player1_name: &str,
        player2_name: &str,
        first_server: ServerChoice,
    ) -> Result<MatchRecord, MatchError> {
        let player1_name = player1_name.trim();
        let player2_name = player2_name.trim();
        if player1_name.is_empty() {
            return Err(MatchError::Validation("Player 1 name is required".to_string()));
        }
        if player2_name.is_empty() {
            return Err(MatchError::Validation("Player 2 name is required".to_string()));
        }

        let server = first_server.resolve(&mut rand::thread_rng());
        let record = MatchRecord::new(
            creator,
            player1_name.to_string(),
            player2_name.to_string(),
            server,
        );

        let created = self.store.create(&record).await.map_err(|e| {
            error!(error = %e, "Failed to create match");
            MatchError::from(e)
        })?;

        info!(
            match_id = %created.id,
            created_by = %creator,
            server = server.number(),
            "Match created"
        );
        Ok(created)
    }

    pub async fn get_match(&self, id: Uuid) -> Result<MatchRecord, MatchError> {
        self.store.get(id).await?.ok_or(MatchError::NotFound(id))
    }

    pub async fn list_matches(&self) -> Result<Vec<MatchRecord>, MatchError> {
        Ok(self.store.list().await?)
    }

    /// Record one point for `scoring_player` (1 or 2) on behalf of `requester`
    pub async fn score_point(
        &self,
        id: Uuid,
        requester: Uuid,
        scoring_player: i64,
    ) -> Result<(MatchRecord, PointOutcome), MatchError> {
        let player = Player::from_number(scoring_player)?;

        let entry = self.write_lock(id);
        let _guard = entry.lock.lock().await;

        let record = self.get_match(id).await?;
        let planned = plan_point(&record, requester, player)?;
        self.commit_point(planned).await
    }

    async fn commit_point(
        &self,
        planned: PlannedPoint,
    ) -> Result<(MatchRecord, PointOutcome), MatchError> {
        let PlannedPoint {
            id,
            version,
            scorer,
            next,
            outcome,
            new_set,
        } = planned;

        let committed = match self.store.commit(id, version, &next, new_set).await {
            Ok(committed) => committed,
            Err(StoreError::VersionConflict { expected, .. }) => {
                warn!(match_id = %id, expected_version = expected, "Lost scoring race");
                return Err(MatchError::Conflict(id));
            }
            Err(e) => {
                error!(match_id = %id, error = %e, "Failed to persist point");
                return Err(e.into());
            }
        };

        info!(
            match_id = %id,
            scorer = scorer.number(),
            outcome = ?outcome,
            version = committed.version,
            "Point recorded"
        );
        Ok((committed, outcome))
    }
}

/// Per-match write lock. The map entry is dropped with the last holder,
/// so only matches with a request in flight keep one.
struct WriteLock<'a> {
    locks: &'a DashMap<Uuid, Arc<Mutex<()>>>,
    id: Uuid,
    lock: Arc<Mutex<()>>,
}

impl Drop for WriteLock<'_> {
    fn drop(&mut self) {
        // Map entry plus this handle
        self.locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) <= 2);
    }
}

/// A point applied to a loaded record, waiting to be committed against
/// the version it was read at
struct PlannedPoint {
    id: Uuid,
    version: i64,
    scorer: Player,
    next: MatchState,
    outcome: PointOutcome,
    new_set: Option<SetRecord>,
}

fn plan_point(
    record: &MatchRecord,
    requester: Uuid,
    player: Player,
) -> Result<PlannedPoint, MatchError> {
    if record.created_by != requester {
        warn!(match_id = %record.id, requester = %requester, "Rejected score from non-creator");
        return Err(MatchError::Forbidden);
    }
    if record.state.is_complete {
        return Err(ScoreError::completed().into());
    }

    let next = apply_point(&record.state, player)?;
    let outcome = classify(&record.state, &next);
    let new_set = closed_set(&record.state, &next)
        .map(|(set_number, set)| SetRecord::new(record.id, set_number, set));

    Ok(PlannedPoint {
        id: record.id,
        version: record.version,
        scorer: player,
        next,
        outcome,
        new_set,
    })
}

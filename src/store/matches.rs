//! Match persistence on Supabase (`matches` + `sets` tables)

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matches::model::{MatchRecord, SetRecord};
use crate::scoring::{MatchState, Player, PlayerScore, Point, ScoreError};

use super::supabase::SupabaseClient;
use super::StoreError;

const MATCHES: &str = "matches";
const SETS: &str = "sets";
const SELECT_WITH_SETS: &str = "select=*,sets(*)";

/// One side of the `score` jsonb column, as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSide {
    points: String,
    games: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredScore {
    player1: StoredSide,
    player2: StoredSide,
}

impl StoredScore {
    fn from_state(state: &MatchState) -> Self {
        let side = |s: &PlayerScore| StoredSide {
            points: s.points.as_str().to_string(),
            games: s.games as i64,
        };
        Self {
            player1: side(&state.player1),
            player2: side(&state.player2),
        }
    }
}

/// Row in the `matches` table, with embedded `sets`
#[derive(Debug, Clone, Deserialize)]
struct MatchRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    created_by: Uuid,
    player1_name: String,
    player2_name: String,
    #[serde(default)]
    score: Option<StoredScore>,
    // Flat columns from before the `score` column existed
    #[serde(default)]
    player1_points: Option<String>,
    #[serde(default)]
    player1_games: Option<i64>,
    #[serde(default)]
    player2_points: Option<String>,
    #[serde(default)]
    player2_games: Option<i64>,
    current_set: i64,
    server: i64,
    is_complete: bool,
    #[serde(default)]
    version: i64,
    #[serde(default)]
    sets: Vec<SetRecord>,
}

fn non_negative(value: i64, what: &str) -> Result<u32, ScoreError> {
    u32::try_from(value).map_err(|_| ScoreError::invalid(format!("{} must be non-negative, got {}", what, value)))
}

fn parse_side(points: &str, games: i64) -> Result<PlayerScore, ScoreError> {
    Ok(PlayerScore {
        points: Point::parse(points)?,
        games: non_negative(games, "game count")?,
    })
}

impl MatchRow {
    /// The stored score, falling back to the legacy flat columns
    fn score(&self) -> Result<StoredScore, ScoreError> {
        if let Some(score) = &self.score {
            return Ok(score.clone());
        }

        match (
            &self.player1_points,
            self.player1_games,
            &self.player2_points,
            self.player2_games,
        ) {
            (Some(p1), Some(g1), Some(p2), Some(g2)) => Ok(StoredScore {
                player1: StoredSide { points: p1.clone(), games: g1 },
                player2: StoredSide { points: p2.clone(), games: g2 },
            }),
            _ => Err(ScoreError::invalid("match row has neither a score nor legacy score columns")),
        }
    }

    fn into_record(self) -> Result<MatchRecord, StoreError> {
        let id = self.id;
        self.build().map_err(|source| StoreError::InvalidRow { id, source })
    }

    fn build(self) -> Result<MatchRecord, ScoreError> {
        let score = self.score()?;
        let current_set = non_negative(self.current_set, "current set")?;

        // Only sets before the live one are history
        let mut sets: Vec<SetRecord> = self
            .sets
            .into_iter()
            .filter(|s| s.set_number < current_set)
            .collect();
        sets.sort_by_key(|s| s.set_number);

        let state = MatchState {
            player1: parse_side(&score.player1.points, score.player1.games)?,
            player2: parse_side(&score.player2.points, score.player2.games)?,
            completed_sets: sets.iter().map(SetRecord::score).collect(),
            current_set,
            server: Player::from_number(self.server)?,
            is_complete: self.is_complete,
        };

        Ok(MatchRecord {
            id: self.id,
            created_at: self.created_at,
            created_by: self.created_by,
            player1_name: self.player1_name,
            player2_name: self.player2_name,
            state,
            version: self.version,
        })
    }
}

/// New row for insertion
#[derive(Debug, Serialize)]
struct NewMatchRow<'a> {
    id: Uuid,
    created_at: DateTime<Utc>,
    created_by: Uuid,
    player1_name: &'a str,
    player2_name: &'a str,
    score: StoredScore,
    current_set: u32,
    server: u8,
    is_complete: bool,
    version: i64,
}

/// Scoring columns written on every committed point
#[derive(Debug, Serialize)]
struct MatchScoreUpdate {
    score: StoredScore,
    current_set: u32,
    server: u8,
    is_complete: bool,
    version: i64,
}

/// Match store backed by Supabase
#[derive(Clone)]
pub struct SupabaseMatchStore {
    client: SupabaseClient,
}

impl SupabaseMatchStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, record: &MatchRecord) -> Result<MatchRecord, StoreError> {
        let row = NewMatchRow {
            id: record.id,
            created_at: record.created_at,
            created_by: record.created_by,
            player1_name: &record.player1_name,
            player2_name: &record.player2_name,
            score: StoredScore::from_state(&record.state),
            current_set: record.state.current_set,
            server: record.state.server.number(),
            is_complete: record.state.is_complete,
            version: record.version,
        };
        let stored: MatchRow = self.client.insert(MATCHES, &row).await?;
        stored.into_record()
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<MatchRecord>, StoreError> {
        let query = format!("id=eq.{}&{}", id, SELECT_WITH_SETS);
        let row: Option<MatchRow> = self.client.get_one(MATCHES, &query).await?;
        row.map(MatchRow::into_record).transpose()
    }

    pub async fn list(&self) -> Result<Vec<MatchRecord>, StoreError> {
        let query = format!("{}&order=created_at.desc", SELECT_WITH_SETS);
        let rows: Vec<MatchRow> = self.client.get(MATCHES, &query).await?;
        rows.into_iter().map(MatchRow::into_record).collect()
    }

    pub async fn list_completed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let query = format!(
            "{}&is_complete=eq.true&created_at=gte.{}&created_at=lt.{}&order=created_at.asc",
            SELECT_WITH_SETS,
            from.to_rfc3339_opts(SecondsFormat::Secs, true),
            to.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        let rows: Vec<MatchRow> = self.client.get(MATCHES, &query).await?;
        rows.into_iter().map(MatchRow::into_record).collect()
    }

    /// Write `state` if the row is still at `expected_version`.
    ///
    /// A newly closed set is upserted first. Its slot is fully determined by
    /// the pre-transition state, and reads ignore set rows at or beyond the
    /// live `current_set`, so a set row left by a losing writer is harmless.
    pub async fn commit(
        &self,
        id: Uuid,
        expected_version: i64,
        state: &MatchState,
        new_set: Option<SetRecord>,
    ) -> Result<MatchRecord, StoreError> {
        if let Some(set) = new_set {
            self.client.upsert(SETS, &set, "match_id,set_number").await?;
        }

        let update = MatchScoreUpdate {
            score: StoredScore::from_state(state),
            current_set: state.current_set,
            server: state.server.number(),
            is_complete: state.is_complete,
            version: expected_version + 1,
        };
        let query = format!("id=eq.{}&version=eq.{}&{}", id, expected_version, SELECT_WITH_SETS);
        let rows: Vec<MatchRow> = self.client.update_returning(MATCHES, &query, &update).await?;

        match rows.into_iter().next() {
            Some(row) => row.into_record(),
            None => Err(StoreError::VersionConflict {
                id,
                expected: expected_version,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(extra: serde_json::Value) -> MatchRow {
        let mut base = json!({
            "id": "4f7e3c1a-6a59-4c52-9d6f-2f3c9b1e0a11",
            "created_at": "2026-10-18T09:30:00Z",
            "created_by": "0b6d7c5e-1d2f-4a3b-8c9d-0e1f2a3b4c5d",
            "player1_name": "Ana",
            "player2_name": "Bea",
            "current_set": 1,
            "server": 2,
            "is_complete": false,
            "version": 7
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn reads_score_column_and_orders_history() {
        let record = row(json!({
            "score": {"player1": {"points": "A", "games": 5}, "player2": {"points": "40", "games": 4}},
            "sets": [
                {"match_id": "4f7e3c1a-6a59-4c52-9d6f-2f3c9b1e0a11", "set_number": 1, "player1_games": 6, "player2_games": 0},
                {"match_id": "4f7e3c1a-6a59-4c52-9d6f-2f3c9b1e0a11", "set_number": 0, "player1_games": 4, "player2_games": 6}
            ]
        }))
        .into_record()
        .unwrap();

        assert_eq!(record.state.player1, PlayerScore { points: Point::Advantage, games: 5 });
        assert_eq!(record.state.server, Player::Player2);
        // set_number 1 is the live set; the stray row is not history
        assert_eq!(record.state.completed_sets.len(), 1);
        assert_eq!(record.state.completed_sets[0].player2_games, 6);
        assert_eq!(record.version, 7);
        assert!(record.state.validate().is_ok());
    }

    #[test]
    fn falls_back_to_legacy_columns() {
        let record = row(json!({
            "current_set": 0,
            "player1_points": "15",
            "player1_games": 2,
            "player2_points": "30",
            "player2_games": 1
        }))
        .into_record()
        .unwrap();

        assert_eq!(record.state.player1.points, Point::Fifteen);
        assert_eq!(record.state.player2.games, 1);
    }

    #[test]
    fn negative_games_are_invalid_input() {
        let err = row(json!({
            "score": {"player1": {"points": "0", "games": -1}, "player2": {"points": "0", "games": 0}}
        }))
        .into_record()
        .unwrap_err();

        assert!(matches!(err, StoreError::InvalidRow { source: ScoreError::InvalidInput(_), .. }));
    }

    #[test]
    fn missing_score_is_invalid_input() {
        assert!(row(json!({})).into_record().is_err());
    }

    #[test]
    fn score_update_uses_stored_point_strings() {
        let mut state = MatchState::new(Player::Player1);
        state.player2.points = Point::Advantage;
        state.player1.points = Point::Forty;
        let json = serde_json::to_value(StoredScore::from_state(&state)).unwrap();
        assert_eq!(json["player1"]["points"], "40");
        assert_eq!(json["player2"]["points"], "A");
    }
}

//! Match records and the response shape served to scoreboards

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::{MatchState, Player, Point, PointOutcome, SetScore};

/// A persisted match: identity, players and the current scoring snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub player1_name: String,
    pub player2_name: String,
    pub state: MatchState,
    /// Bumped on every committed point, used for compare-and-swap writes
    pub version: i64,
}

impl MatchRecord {
    pub fn new(created_by: Uuid, player1_name: String, player2_name: String, server: Player) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            created_by,
            player1_name,
            player2_name,
            state: MatchState::new(server),
            version: 0,
        }
    }
}

/// A finished set as its own ordered row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRecord {
    pub match_id: Uuid,
    pub set_number: u32,
    pub player1_games: u32,
    pub player2_games: u32,
}

impl SetRecord {
    pub fn new(match_id: Uuid, set_number: u32, set: SetScore) -> Self {
        Self {
            match_id,
            set_number,
            player1_games: set.player1_games,
            player2_games: set.player2_games,
        }
    }

    pub fn score(&self) -> SetScore {
        SetScore::new(self.player1_games, self.player2_games)
    }
}

/// Who serves first in a new match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerChoice {
    #[default]
    Player1,
    Player2,
    CoinToss,
}

impl ServerChoice {
    pub fn resolve<R: rand::Rng>(self, rng: &mut R) -> Player {
        match self {
            ServerChoice::Player1 => Player::Player1,
            ServerChoice::Player2 => Player::Player2,
            ServerChoice::CoinToss => {
                if rng.gen_bool(0.5) {
                    Player::Player1
                } else {
                    Player::Player2
                }
            }
        }
    }
}

/// Per-player block of a match response
#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub name: String,
    pub points: Point,
    pub games: u32,
    /// Games won in each completed set, in set order
    pub sets: Vec<u32>,
}

/// Match as served to clients
#[derive(Debug, Clone, Serialize)]
pub struct MatchResponse {
    pub id: Uuid,
    /// Unix millis
    pub created_at: i64,
    pub created_by: Uuid,
    pub is_complete: bool,
    pub current_set: u32,
    pub server: Player,
    pub player1: PlayerView,
    pub player2: PlayerView,
    pub completed_sets: Vec<SetScore>,
    pub winner: Option<Player>,
    pub version: i64,
    pub state_hash: String,
}

impl From<&MatchRecord> for MatchResponse {
    fn from(record: &MatchRecord) -> Self {
        let state = &record.state;
        let view = |name: &str, player: Player| PlayerView {
            name: name.to_string(),
            points: state.side(player).points,
            games: state.side(player).games,
            sets: state.completed_sets.iter().map(|s| s.games(player)).collect(),
        };

        Self {
            id: record.id,
            created_at: record.created_at.timestamp_millis(),
            created_by: record.created_by,
            is_complete: state.is_complete,
            current_set: state.current_set,
            server: state.server,
            player1: view(&record.player1_name, Player::Player1),
            player2: view(&record.player2_name, Player::Player2),
            completed_sets: state.completed_sets.clone(),
            winner: state.winner(),
            version: record.version,
            state_hash: state.fingerprint(),
        }
    }
}

/// Result of a scoring request
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResponse {
    #[serde(rename = "match")]
    pub game_match: MatchResponse,
    pub outcome: PointOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn response_splits_set_history_per_player() {
        let mut record = MatchRecord::new(Uuid::new_v4(), "Ana".into(), "Bea".into(), Player::Player2);
        record.state.completed_sets = vec![SetScore::new(6, 4), SetScore::new(5, 7)];
        record.state.current_set = 2;
        record.state.player1.points = Point::Forty;
        record.state.player2.games = 3;

        let response = MatchResponse::from(&record);
        assert_eq!(response.player1.sets, vec![6, 5]);
        assert_eq!(response.player2.sets, vec![4, 7]);
        assert_eq!(response.player2.games, 3);
        assert_eq!(response.current_set, 2);
        assert_eq!(response.winner, None);
        assert_eq!(response.state_hash, record.state.fingerprint());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["player1"]["points"], "40");
        assert_eq!(json["server"], 2);
    }

    #[test]
    fn server_choice_defaults_to_player_one() {
        let choice: ServerChoice = Default::default();
        let mut rng = StepRng::new(0, 1);
        assert_eq!(choice.resolve(&mut rng), Player::Player1);
        assert_eq!(ServerChoice::Player2.resolve(&mut rng), Player::Player2);

        let parsed: ServerChoice = serde_json::from_str("\"coin_toss\"").unwrap();
        assert_eq!(parsed, ServerChoice::CoinToss);
    }
}

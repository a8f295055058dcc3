//! Match state snapshot and its structural invariants

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::error::ScoreError;

/// Games needed to take a set (with a two game margin)
pub const GAMES_TO_WIN_SET: u32 = 6;

/// Sets needed to take a best-of-three match
pub const SETS_TO_WIN_MATCH: usize = 2;

/// Score within the current game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Point {
    #[default]
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "15")]
    Fifteen,
    #[serde(rename = "30")]
    Thirty,
    #[serde(rename = "40")]
    Forty,
    #[serde(rename = "A")]
    Advantage,
}

impl Point {
    pub fn as_str(&self) -> &'static str {
        match self {
            Point::Zero => "0",
            Point::Fifteen => "15",
            Point::Thirty => "30",
            Point::Forty => "40",
            Point::Advantage => "A",
        }
    }

    /// Parse the stored string form ("0", "15", "30", "40", "A")
    pub fn parse(s: &str) -> Result<Self, ScoreError> {
        match s {
            "0" => Ok(Point::Zero),
            "15" => Ok(Point::Fifteen),
            "30" => Ok(Point::Thirty),
            "40" => Ok(Point::Forty),
            "A" => Ok(Point::Advantage),
            other => Err(ScoreError::invalid(format!("unknown point value '{}'", other))),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of the match. Serialized as the integers 1 and 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Player {
    Player1,
    Player2,
}

impl Player {
    /// Convert a raw scoring-player identifier
    pub fn from_number(n: i64) -> Result<Self, ScoreError> {
        match n {
            1 => Ok(Player::Player1),
            2 => Ok(Player::Player2),
            other => Err(ScoreError::invalid(format!(
                "scoring player must be 1 or 2, got {}",
                other
            ))),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Player::Player1 => 1,
            Player::Player2 => 2,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Player::Player1 => Player::Player2,
            Player::Player2 => Player::Player1,
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = ScoreError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Player::from_number(n as i64)
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> u8 {
        player.number()
    }
}

/// Points and games for one player in the set being played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlayerScore {
    pub points: Point,
    pub games: u32,
}

/// Final games of a finished set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScore {
    pub player1_games: u32,
    pub player2_games: u32,
}

impl SetScore {
    pub fn new(player1_games: u32, player2_games: u32) -> Self {
        Self {
            player1_games,
            player2_games,
        }
    }

    pub fn games(&self, player: Player) -> u32 {
        match player {
            Player::Player1 => self.player1_games,
            Player::Player2 => self.player2_games,
        }
    }

    pub fn winner(&self) -> Option<Player> {
        if self.player1_games > self.player2_games {
            Some(Player::Player1)
        } else if self.player2_games > self.player1_games {
            Some(Player::Player2)
        } else {
            None
        }
    }
}

impl fmt::Display for SetScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.player1_games, self.player2_games)
    }
}

/// Whether `games` against `opponent_games` closes a set
pub fn wins_set(games: u32, opponent_games: u32) -> bool {
    games >= GAMES_TO_WIN_SET && games >= opponent_games.saturating_add(2)
}

/// Full scoring snapshot of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub player1: PlayerScore,
    pub player2: PlayerScore,
    /// Finished sets in the order they were played
    pub completed_sets: Vec<SetScore>,
    /// 0-based index of the set accruing games
    pub current_set: u32,
    pub server: Player,
    pub is_complete: bool,
}

impl MatchState {
    /// Fresh match with `server` serving the first game
    pub fn new(server: Player) -> Self {
        Self {
            player1: PlayerScore::default(),
            player2: PlayerScore::default(),
            completed_sets: Vec::new(),
            current_set: 0,
            server,
            is_complete: false,
        }
    }

    pub fn side(&self, player: Player) -> &PlayerScore {
        match player {
            Player::Player1 => &self.player1,
            Player::Player2 => &self.player2,
        }
    }

    pub fn side_mut(&mut self, player: Player) -> &mut PlayerScore {
        match player {
            Player::Player1 => &mut self.player1,
            Player::Player2 => &mut self.player2,
        }
    }

    /// Sets won by `player`, recounted from the completed set history
    pub fn sets_won(&self, player: Player) -> usize {
        self.completed_sets
            .iter()
            .filter(|set| set.winner() == Some(player))
            .count()
    }

    /// Winner of a complete match
    pub fn winner(&self) -> Option<Player> {
        if !self.is_complete {
            return None;
        }
        [Player::Player1, Player::Player2]
            .into_iter()
            .find(|p| self.sets_won(*p) >= SETS_TO_WIN_MATCH)
    }

    /// Hex SHA-256 of the canonical JSON form
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }

    /// Check the structural invariants a state produced by scoring always holds
    pub fn validate(&self) -> Result<(), ScoreError> {
        if self.completed_sets.len() != self.current_set as usize {
            return Err(ScoreError::invalid(format!(
                "current set {} does not match {} completed sets",
                self.current_set,
                self.completed_sets.len()
            )));
        }

        for (idx, set) in self.completed_sets.iter().enumerate() {
            let (high, low) = if set.player1_games >= set.player2_games {
                (set.player1_games, set.player2_games)
            } else {
                (set.player2_games, set.player1_games)
            };
            let closing = low.checked_add(2).map(|n| n.max(GAMES_TO_WIN_SET));
            if closing != Some(high) {
                return Err(ScoreError::invalid(format!(
                    "set {} ended {} which is not a finished set",
                    idx, set
                )));
            }
        }

        let p1_sets = self.sets_won(Player::Player1);
        let p2_sets = self.sets_won(Player::Player2);
        let decided = p1_sets >= SETS_TO_WIN_MATCH || p2_sets >= SETS_TO_WIN_MATCH;
        if p1_sets > SETS_TO_WIN_MATCH
            || p2_sets > SETS_TO_WIN_MATCH
            || (p1_sets == SETS_TO_WIN_MATCH && p2_sets == SETS_TO_WIN_MATCH)
        {
            return Err(ScoreError::invalid("sets played past the end of the match"));
        }
        if decided {
            let last_winner = self.completed_sets.last().and_then(SetScore::winner);
            if last_winner.map(|p| self.sets_won(p)) != Some(SETS_TO_WIN_MATCH) {
                return Err(ScoreError::invalid("sets played past the end of the match"));
            }
        }
        if decided != self.is_complete {
            return Err(ScoreError::invalid(format!(
                "completion flag {} disagrees with sets won {}-{}",
                self.is_complete, p1_sets, p2_sets
            )));
        }

        if wins_set(self.player1.games, self.player2.games)
            || wins_set(self.player2.games, self.player1.games)
        {
            return Err(ScoreError::invalid(format!(
                "games {}-{} should have closed the set",
                self.player1.games, self.player2.games
            )));
        }

        match (self.player1.points, self.player2.points) {
            (Point::Advantage, Point::Forty) | (Point::Forty, Point::Advantage) => {}
            (Point::Advantage, other) | (other, Point::Advantage) => {
                return Err(ScoreError::invalid(format!(
                    "advantage against {} is not reachable",
                    other
                )));
            }
            _ => {}
        }

        let idle = PlayerScore::default();
        if self.is_complete && (self.player1 != idle || self.player2 != idle) {
            return Err(ScoreError::invalid("complete match still has a game in progress"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(sets: &[(u32, u32)], games: (u32, u32), points: (Point, Point)) -> MatchState {
        let mut state = MatchState::new(Player::Player1);
        state.completed_sets = sets.iter().map(|&(a, b)| SetScore::new(a, b)).collect();
        state.current_set = sets.len() as u32;
        state.player1 = PlayerScore { points: points.0, games: games.0 };
        state.player2 = PlayerScore { points: points.1, games: games.1 };
        state
    }

    #[test]
    fn new_match_is_valid() {
        assert!(MatchState::new(Player::Player2).validate().is_ok());
    }

    #[test]
    fn deuce_is_a_valid_resting_state() {
        let state = state_with(&[], (3, 3), (Point::Forty, Point::Forty));
        assert!(state.validate().is_ok());
    }

    #[test]
    fn rejects_set_index_drift() {
        let mut state = state_with(&[(6, 2)], (0, 0), (Point::Zero, Point::Zero));
        state.current_set = 2;
        assert!(matches!(state.validate(), Err(ScoreError::InvalidInput(_))));
    }

    #[test]
    fn rejects_unfinished_set_in_history() {
        let state = state_with(&[(6, 5)], (0, 0), (Point::Zero, Point::Zero));
        assert!(state.validate().is_err());
        let state = state_with(&[(9, 6)], (0, 0), (Point::Zero, Point::Zero));
        assert!(state.validate().is_err());
    }

    #[test]
    fn accepts_long_sets_in_history() {
        let state = state_with(&[(8, 10), (6, 0)], (4, 4), (Point::Thirty, Point::Zero));
        assert!(state.validate().is_ok());
    }

    #[test]
    fn rejects_games_that_should_have_closed() {
        let state = state_with(&[], (6, 4), (Point::Zero, Point::Zero));
        assert!(state.validate().is_err());
    }

    #[test]
    fn rejects_unreachable_advantage() {
        let state = state_with(&[], (0, 0), (Point::Advantage, Point::Thirty));
        assert!(state.validate().is_err());
        let state = state_with(&[], (0, 0), (Point::Advantage, Point::Advantage));
        assert!(state.validate().is_err());
    }

    #[test]
    fn rejects_completion_flag_mismatch() {
        let state = state_with(&[(6, 3), (6, 4)], (0, 0), (Point::Zero, Point::Zero));
        assert!(state.validate().is_err());

        let mut state = state_with(&[(6, 3)], (0, 0), (Point::Zero, Point::Zero));
        state.is_complete = true;
        assert!(state.validate().is_err());
    }

    #[test]
    fn rejects_game_counts_at_the_integer_limit() {
        let state = state_with(&[], (6, u32::MAX), (Point::Zero, Point::Zero));
        assert!(matches!(state.validate(), Err(ScoreError::InvalidInput(_))));

        let state = state_with(&[(u32::MAX, u32::MAX - 1)], (0, 0), (Point::Zero, Point::Zero));
        assert!(matches!(state.validate(), Err(ScoreError::InvalidInput(_))));
    }

    #[test]
    fn rejects_sets_after_the_deciding_one() {
        let mut state = state_with(&[(6, 0), (6, 0), (0, 6)], (0, 0), (Point::Zero, Point::Zero));
        state.is_complete = true;
        assert!(state.validate().is_err());
    }

    #[test]
    fn winner_is_recounted_from_history() {
        let mut state = state_with(&[(3, 6), (7, 5), (6, 1)], (0, 0), (Point::Zero, Point::Zero));
        state.is_complete = true;
        assert!(state.validate().is_ok());
        assert_eq!(state.winner(), Some(Player::Player1));
        assert_eq!(state.sets_won(Player::Player2), 1);
    }

    #[test]
    fn serializes_points_and_server_like_the_stored_rows() {
        let state = state_with(&[], (2, 1), (Point::Advantage, Point::Forty));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["player1"]["points"], "A");
        assert_eq!(json["player2"]["points"], "40");
        assert_eq!(json["server"], 1);

        let back: MatchState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn rejects_unknown_server_number() {
        let mut json = serde_json::to_value(MatchState::new(Player::Player1)).unwrap();
        json["server"] = serde_json::json!(3);
        assert!(serde_json::from_value::<MatchState>(json).is_err());
    }

    #[test]
    fn player_numbers() {
        assert_eq!(Player::from_number(1), Ok(Player::Player1));
        assert_eq!(Player::from_number(2), Ok(Player::Player2));
        assert!(matches!(Player::from_number(0), Err(ScoreError::InvalidInput(_))));
        assert!(matches!(Player::from_number(-1), Err(ScoreError::InvalidInput(_))));
        assert_eq!(Player::Player1.opponent(), Player::Player2);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = MatchState::new(Player::Player1);
        let b = MatchState::new(Player::Player2);
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}

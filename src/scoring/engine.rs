//! Point -> game -> set -> match transition rules

use super::error::ScoreError;
use super::state::{wins_set, MatchState, Player, Point, SetScore, SETS_TO_WIN_MATCH};

/// How far a single point carried the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointOutcome {
    /// Only the game score moved
    Point,
    /// A game was won and service changed
    Game,
    /// A set was closed
    Set,
    /// The match was decided
    Match,
}

/// Result of resolving the game score for (player, opponent)
enum PointResolution {
    Continue { player: Point, opponent: Point },
    GameWon,
}

fn resolve_points(player: Point, opponent: Point) -> PointResolution {
    use Point::*;
    use PointResolution::*;

    match (player, opponent) {
        // Deuce -> advantage
        (Forty, Forty) => Continue {
            player: Advantage,
            opponent: Forty,
        },
        (Forty, Zero | Fifteen | Thirty) => GameWon,
        // Back to deuce
        (player, Advantage) => Continue {
            player,
            opponent: Forty,
        },
        (Advantage, _) => GameWon,
        (Zero, opponent) => Continue {
            player: Fifteen,
            opponent,
        },
        (Fifteen, opponent) => Continue {
            player: Thirty,
            opponent,
        },
        (Thirty, opponent) => Continue {
            player: Forty,
            opponent,
        },
    }
}

/// Apply one point won by `scoring_player` and return the next state.
///
/// Pure and deterministic: the input is never modified and identical inputs
/// always produce identical outputs. Completed matches are rejected with
/// [`ScoreError::IllegalTransition`], malformed snapshots with
/// [`ScoreError::InvalidInput`].
pub fn apply_point(state: &MatchState, scoring_player: Player) -> Result<MatchState, ScoreError> {
    if state.is_complete {
        return Err(ScoreError::completed());
    }
    state.validate()?;

    let opponent = scoring_player.opponent();
    let mut next = state.clone();

    match resolve_points(next.side(scoring_player).points, next.side(opponent).points) {
        PointResolution::Continue {
            player: player_points,
            opponent: opponent_points,
        } => {
            next.side_mut(scoring_player).points = player_points;
            next.side_mut(opponent).points = opponent_points;
            return Ok(next);
        }
        PointResolution::GameWon => {
            next.player1.points = Point::Zero;
            next.player2.points = Point::Zero;
        }
    }

    next.side_mut(scoring_player).games += 1;
    next.server = next.server.opponent();

    let winner_games = next.side(scoring_player).games;
    let loser_games = next.side(opponent).games;
    if !wins_set(winner_games, loser_games) {
        return Ok(next);
    }

    next.completed_sets
        .push(SetScore::new(next.player1.games, next.player2.games));
    next.player1.games = 0;
    next.player2.games = 0;
    next.current_set += 1;

    if next.sets_won(scoring_player) >= SETS_TO_WIN_MATCH {
        next.is_complete = true;
    }

    Ok(next)
}

/// Classify the transition from `before` to `after`
pub fn classify(before: &MatchState, after: &MatchState) -> PointOutcome {
    if after.is_complete && !before.is_complete {
        PointOutcome::Match
    } else if after.current_set > before.current_set {
        PointOutcome::Set
    } else if after.player1.games != before.player1.games
        || after.player2.games != before.player2.games
    {
        PointOutcome::Game
    } else {
        PointOutcome::Point
    }
}

/// Set closed by the transition from `before` to `after`, with its set number
pub fn closed_set(before: &MatchState, after: &MatchState) -> Option<(u32, SetScore)> {
    if after.completed_sets.len() > before.completed_sets.len() {
        after
            .completed_sets
            .last()
            .map(|set| (before.current_set, *set))
    } else {
        None
    }
}

/// Rebuild a match from its point log
pub fn replay(server: Player, points: &[Player]) -> Result<MatchState, ScoreError> {
    points
        .iter()
        .try_fold(MatchState::new(server), |state, player| apply_point(&state, *player))
}

//! Property tests over random point sequences

use proptest::prelude::*;

use super::engine::{apply_point, classify, PointOutcome};
use super::error::ScoreError;
use super::state::{MatchState, Player};

fn player() -> impl Strategy<Value = Player> {
    prop_oneof![Just(Player::Player1), Just(Player::Player2)]
}

/// Point logs with a random bias so some matches finish and some sets run long
fn point_log() -> impl Strategy<Value = Vec<Player>> {
    (0.2f64..0.8).prop_flat_map(|bias| {
        prop::collection::vec(
            prop::bool::weighted(bias).prop_map(|p1| {
                if p1 {
                    Player::Player1
                } else {
                    Player::Player2
                }
            }),
            0..400,
        )
    })
}

proptest! {
    #[test]
    fn every_transition_keeps_the_invariants(server in player(), log in point_log()) {
        let mut state = MatchState::new(server);

        for p in log {
            if state.is_complete {
                let err = apply_point(&state, p).unwrap_err();
                prop_assert!(matches!(err, ScoreError::IllegalTransition(_)));
                continue;
            }

            let next = apply_point(&state, p).unwrap();
            prop_assert!(next.validate().is_ok());

            // History only grows, and always by at most one set
            prop_assert!(next.completed_sets.len() >= state.completed_sets.len());
            prop_assert!(next.completed_sets.len() <= state.completed_sets.len() + 1);
            prop_assert_eq!(&next.completed_sets[..state.completed_sets.len()], &state.completed_sets[..]);
            prop_assert_eq!(next.completed_sets.len(), next.current_set as usize);

            match classify(&state, &next) {
                PointOutcome::Point => {
                    prop_assert_eq!(next.server, state.server);
                    prop_assert_eq!(next.player1.games, state.player1.games);
                    prop_assert_eq!(next.player2.games, state.player2.games);
                    prop_assert_eq!(next.is_complete, state.is_complete);
                }
                PointOutcome::Game => {
                    prop_assert_eq!(next.server, state.server.opponent());
                    prop_assert_eq!(next.side(p).games, state.side(p).games + 1);
                    prop_assert_eq!(next.side(p.opponent()).games, state.side(p.opponent()).games);
                }
                PointOutcome::Set | PointOutcome::Match => {
                    prop_assert_eq!(next.server, state.server.opponent());
                    prop_assert_eq!(next.player1.games, 0);
                    prop_assert_eq!(next.player2.games, 0);
                    let closed = next.completed_sets.last().unwrap();
                    prop_assert_eq!(closed.winner(), Some(p));
                }
            }

            state = next;
        }
    }

    #[test]
    fn transitions_are_deterministic(server in player(), log in point_log(), last in player()) {
        let mut state = MatchState::new(server);
        for p in log {
            match apply_point(&state, p) {
                Ok(next) => state = next,
                Err(_) => break,
            }
        }

        let a = apply_point(&state, last);
        let b = apply_point(&state, last);
        prop_assert_eq!(&a, &b);
        if let (Ok(a), Ok(b)) = (a, b) {
            prop_assert_eq!(a.fingerprint(), b.fingerprint());
        }
    }

    #[test]
    fn completion_needs_exactly_two_sets(server in player(), log in point_log()) {
        let mut state = MatchState::new(server);
        for p in log {
            match apply_point(&state, p) {
                Ok(next) => state = next,
                Err(_) => break,
            }
        }

        let winner = state.winner();
        prop_assert_eq!(winner.is_some(), state.is_complete);
        if let Some(winner) = winner {
            prop_assert_eq!(state.sets_won(winner), 2);
            prop_assert!(state.sets_won(winner.opponent()) <= 1);
            prop_assert!(state.completed_sets.len() <= 3);
            // The deciding set is always the last one recorded
            prop_assert_eq!(state.completed_sets.last().and_then(|s| s.winner()), Some(winner));
        }
    }
}

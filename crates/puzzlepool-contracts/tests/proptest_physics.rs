//! Property-based tests for the physics and the on-chain game loop.
//!
//! The game loop is exercised through real transactions, so case counts
//! are kept low.

use proptest::prelude::*;
use puzzlepool_contracts::physics::{
    BALL_COUNT, BallState, FORBID, PhysicsParams, SystemState, TouchedMask, euler_forward,
    simulate,
};
use puzzlepool_contracts::puzzle::{MAX_FRAMES, PUZZLES, evaluate};
use puzzlepool_contracts::test_utils::*;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_touched() -> impl Strategy<Value = TouchedMask> {
    any::<[bool; BALL_COUNT]>().prop_map(TouchedMask)
}

/// Unscaled launch velocity inside the accepted range.
fn arb_velocity() -> impl Strategy<Value = (i64, i64)> {
    (-400i64..=400, -400i64..=400)
}

/// Five balls at rest on a grid, far enough apart never to overlap.
fn arb_resting_system() -> impl Strategy<Value = SystemState> {
    proptest::collection::vec((1i64..=7, 1i64..=9), BALL_COUNT).prop_map(|cells| {
        let mut state = SystemState::default();
        for (i, (ball, (cx, cy))) in state.balls.iter_mut().zip(cells).enumerate() {
            // Offset each ball by index so two never share a cell.
            let x = (cx * 50 + i as i64 * 7) * SCALE;
            let y = (cy * 50 + (i as i64 % 2) * 3) * SCALE;
            *ball = BallState::at(x.min(385 * SCALE), y.min(485 * SCALE));
        }
        state
    })
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Touching the forbidden ball always scores zero; otherwise the score
    /// is one of the sums of 10, 15 and 20.
    #[test]
    fn score_is_a_subset_sum(touched in arb_touched()) {
        let score = evaluate(&touched);
        if touched.is_touched(FORBID) {
            prop_assert_eq!(score, 0);
        } else {
            prop_assert!([0, 10, 15, 20, 25, 30, 35, 45].contains(&score));
        }
    }

    /// Touched balls never become untouched by a union.
    #[test]
    fn union_is_monotone(a in arb_touched(), b in arb_touched()) {
        let u = a.union(b);
        for i in 0..BALL_COUNT {
            prop_assert_eq!(u.is_touched(i), a.is_touched(i) || b.is_touched(i));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A system of separated balls at rest does not move and touches nothing.
    #[test]
    fn rest_is_a_fixed_point(state in arb_resting_system()) {
        let mut distinct = true;
        for i in 0..BALL_COUNT {
            for j in (i + 1)..BALL_COUNT {
                let (a, b) = (&state.balls[i], &state.balls[j]);
                if (a.x - b.x).abs() < 30 * SCALE && (a.y - b.y).abs() < 30 * SCALE {
                    distinct = false;
                }
            }
        }
        prop_assume!(distinct);
        let (next, touched) = euler_forward(&state, &PhysicsParams::default());
        prop_assert_eq!(next, state);
        prop_assert_eq!(touched, TouchedMask::NONE);
    }

    /// Simulation is deterministic.
    #[test]
    fn simulation_is_deterministic((vx, vy) in arb_velocity(), puzzle in 0usize..2) {
        let params = PhysicsParams::default();
        let initial = PUZZLES[puzzle]
            .layout(SCALE)
            .initial_state()
            .with_player_velocity(vx * SCALE, vy * SCALE);
        let a = simulate(&initial, &params, MAX_FRAMES);
        let b = simulate(&initial, &params, MAX_FRAMES);
        prop_assert_eq!(a, b);
        prop_assert!(a.frames <= MAX_FRAMES);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Playing a move on-chain, chunk by chunk, records the same score as
    /// simulating it in one go.
    #[test]
    fn on_chain_game_matches_direct_simulation((vx, vy) in arb_velocity()) {
        let mut game = wired_game();
        let puzzle_id = game.next_puzzle();
        game.make_move(vx, vy).unwrap();
        let continues = game.finish_game();
        prop_assert!(continues <= 3);

        let initial = PUZZLES[puzzle_id as usize]
            .layout(SCALE)
            .initial_state()
            .with_player_velocity(vx * SCALE, vy * SCALE);
        let direct = simulate(&initial, &PhysicsParams::default(), MAX_FRAMES);

        prop_assert_eq!(game.record(puzzle_id).score, evaluate(&direct.touched));
        let view = game.manager.view_game(&game.state).unwrap();
        prop_assert_eq!(view.state, direct.state);
        prop_assert_eq!(view.frame, direct.frames);
    }
}

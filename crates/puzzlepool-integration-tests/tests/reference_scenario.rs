//! End-to-end runs of the harness scenario.
//!
//! These tests drive the public harness API exactly as the example binary
//! does: fresh execution state, five deployments, one move, and a score
//! check at the shrine.

use puzzlepool_chain::{ContractError, ExecutionState};
use puzzlepool_contracts::{Deployment, InventoryClient, ShrineClient, TouchedMask};
use puzzlepool_harness::{HarnessConfig, HarnessError, Scenario};
use std::path::PathBuf;

fn scenario_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../puzzlepool-harness/scenarios")
        .join(name)
}

// ============================================================================
// Reference move
// ============================================================================

#[test]
fn reference_move_scores_45_on_first_puzzle() {
    let config = HarnessConfig::default();
    let player = puzzlepool_chain::ContractAddress::from_u64(config.player);
    let mut state = ExecutionState::empty(config.chain.clone());
    let report = Scenario::new(config).run_in(&mut state).unwrap();

    assert_eq!(report.puzzle.puzzle_id, 0);
    assert_eq!(report.record.score, 45);
    assert_eq!(report.record.attempts, 1);

    // 150 frames at 40 per transaction: MakeMove plus three continues.
    assert_eq!(report.first_move.frames_run, 40);
    assert!(!report.first_move.finished);
    assert_eq!(report.continues, 3);
    assert_eq!(state.transactions().count_selector("ContinueMove"), 3);

    assert_eq!(report.game.frame, 150);
    assert_eq!(
        report.game.touched,
        TouchedMask([true, true, true, false, true])
    );

    let balance = InventoryClient::new(report.deployment.inventory)
        .view_balance(&state, player)
        .unwrap();
    assert_eq!(balance, 45);
}

#[test]
fn rotating_to_second_puzzle_scores_35() {
    let config = HarnessConfig::load(&scenario_file("second_puzzle.ron")).unwrap();
    let report = Scenario::new(config).run().unwrap();
    assert_eq!(report.puzzle.puzzle_id, 1);
    assert_eq!(report.record.score, 35);
    assert_eq!(report.expected_score, Some(35));
    assert_eq!(report.continues, 3);
}

#[test]
fn velocities_travel_mod_p() {
    let config = HarnessConfig::load(&scenario_file("second_puzzle.ron")).unwrap();
    let field = config.chain.field;
    let report = Scenario::new(config).run().unwrap();
    let (vx, vy) = report.velocity;
    assert!(vx.value() > field.half());
    assert_eq!(field.decode_i64(vx).unwrap(), -1_000_000);
    assert_eq!(field.decode_i64(vy).unwrap(), -2_300_000);
}

#[test]
fn coarser_scale_reproduces_both_scores() {
    for (initializations, puzzle_id, score) in [(1, 0, 45), (2, 1, 35)] {
        let config = HarnessConfig {
            scale: 1_000,
            puzzle_initializations: initializations,
            ..HarnessConfig::default()
        };
        let report = Scenario::new(config).run().unwrap();
        assert_eq!(report.puzzle.puzzle_id, puzzle_id);
        assert_eq!(report.puzzle.layout.positions[0].0 % 1_000, 0);
        assert_eq!(report.record.score, score);
    }
}

// ============================================================================
// Failure modes
// ============================================================================

#[test]
fn tight_step_budget_reverts_the_move() {
    let config = HarnessConfig::load(&scenario_file("tight_budget.toml")).unwrap();
    let err = Scenario::new(config).run().unwrap_err();
    match err {
        HarnessError::Execution(e) => assert!(matches!(
            e.contract_error(),
            Some(ContractError::OutOfResources { .. })
        )),
        other => panic!("expected execution error, got {other}"),
    }
}

#[test]
fn continue_loop_is_bounded() {
    let config = HarnessConfig {
        max_continue_iterations: 1,
        ..HarnessConfig::default()
    };
    let err = Scenario::new(config).run().unwrap_err();
    assert!(matches!(err, HarnessError::ContinueLimit { limit: 1 }));
}

#[test]
fn exact_bound_is_enough() {
    let config = HarnessConfig {
        max_continue_iterations: 3,
        ..HarnessConfig::default()
    };
    assert_eq!(Scenario::new(config).run().unwrap().continues, 3);
}

// ============================================================================
// Determinism and snapshots
// ============================================================================

#[test]
fn runs_are_deterministic() {
    let a = Scenario::new(HarnessConfig::default()).run().unwrap();
    let b = Scenario::new(HarnessConfig::default()).run().unwrap();
    assert_eq!(a.state_root, b.state_root);
    assert_eq!(a, b);
}

#[test]
fn snapshot_replays_into_fresh_deployment() {
    let config = HarnessConfig::default();
    let mut state = ExecutionState::empty(config.chain.clone());
    let report = Scenario::new(config.clone()).run_in(&mut state).unwrap();
    let data = state.snapshot_storage().unwrap();

    let mut fresh = ExecutionState::empty(config.chain.clone());
    let deployment = Deployment::deploy(&mut fresh, config.scale).unwrap();
    assert_eq!(deployment, report.deployment);
    fresh.restore_storage(&data).unwrap();

    assert_eq!(fresh.state_root(), report.state_root);
    let record = ShrineClient::new(deployment.shrine)
        .view_record(
            &fresh,
            0,
            puzzlepool_chain::ContractAddress::from_u64(config.player),
        )
        .unwrap();
    assert_eq!(record.score, 45);
}

//! The end-to-end scenario: deploy, wire, play one move, check the score.
//!
//! Steps run strictly in order and the first failure aborts the run:
//!
//! 1. Deploy `chef`, `server`, `inventory`, `shrine`, `manager`.
//! 2. `admin_initialize_addresses`, then `admin_initialize_puzzle`.
//! 3. `client_pull_puzzle` to learn the puzzle id.
//! 4. `MakeMove` with the configured velocity for that puzzle.
//! 5. `ContinueMove` while the manager reports an unfinished game, at most
//!    `max_continue_iterations` times.
//! 6. `shrine.view_record` and compare with the expected score.

use crate::config::HarnessConfig;
use crate::display::{decode_ball, format_system_state};
use crate::error::HarnessError;
use puzzlepool_chain::{ContractAddress, ExecutionState};
use puzzlepool_contracts::{
    CONTRACT_NAMES, Deployment, GameView, ManagerClient, MoveOutcome, PulledPuzzle, Record,
    ShrineClient, SystemState, definition,
};
use puzzlepool_felt::Felt;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// What a completed run observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub deployment: Deployment,
    pub puzzle: PulledPuzzle,
    /// Field-encoded launch velocity as sent to `MakeMove`.
    pub velocity: (Felt, Felt),
    pub first_move: MoveOutcome,
    /// `ContinueMove` transactions sent.
    pub continues: u32,
    pub record: Record,
    /// `None` when the configuration lists no expectation for the puzzle.
    pub expected_score: Option<u64>,
    pub game: GameView,
    pub state_root: u64,
}

/// Drives the scenario described by a [`HarnessConfig`].
#[derive(Debug, Clone)]
pub struct Scenario {
    config: HarnessConfig,
}

impl Scenario {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    fn admin(&self) -> ContractAddress {
        ContractAddress::from_u64(self.config.admin)
    }

    fn player(&self) -> ContractAddress {
        ContractAddress::from_u64(self.config.player)
    }

    /// Run against a fresh execution state built from the configuration.
    pub fn run(&self) -> Result<ScenarioReport, HarnessError> {
        self.config.validate()?;
        let mut state = ExecutionState::empty(self.config.chain.clone());
        self.run_in(&mut state)
    }

    /// Run against an existing execution state.
    pub fn run_in(&self, state: &mut ExecutionState) -> Result<ScenarioReport, HarnessError> {
        let deployment = self.deploy(state)?;
        let manager = ManagerClient::new(deployment.manager);

        manager.admin_initialize_addresses(
            state,
            self.admin(),
            deployment.inventory,
            deployment.server,
            deployment.chef,
            deployment.shrine,
        )?;
        info!("manager: admin_initialize_addresses() completed");

        for _ in 0..self.config.puzzle_initializations {
            manager.admin_initialize_puzzle(state, self.admin())?;
            info!("manager: admin_initialize_puzzle() completed");
        }

        let puzzle = manager.client_pull_puzzle(state)?;
        info!(
            puzzle_id = puzzle.puzzle_id,
            layout = ?puzzle.layout.positions,
            "manager: client_pull_puzzle() returned"
        );

        let velocity = self.encode_velocity(state, puzzle.puzzle_id)?;
        let first_move = manager.make_move(state, self.player(), velocity.0, velocity.1)?;
        info!(
            vx = %velocity.0,
            vy = %velocity.1,
            frames_run = first_move.frames_run,
            finished = first_move.finished,
            "manager: MakeMove() returned"
        );

        let continues = self.drive_to_completion(state, &manager)?;

        let record = ShrineClient::new(deployment.shrine).view_record(
            state,
            puzzle.puzzle_id,
            self.player(),
        )?;
        info!(
            puzzle_id = puzzle.puzzle_id,
            player = self.config.player,
            score = record.score,
            attempts = record.attempts,
            "shrine: view_record() returned"
        );

        let game = manager.view_game(state)?;
        let stored = Self::stored_balls(state, deployment.manager)?;
        for line in format_system_state(&stored, self.config.scale) {
            debug!("{line}");
        }

        let expected_score = self.config.expected_score(puzzle.puzzle_id);
        match expected_score {
            Some(expected) if expected != record.score => {
                return Err(HarnessError::ScoreMismatch {
                    puzzle_id: puzzle.puzzle_id,
                    expected,
                    actual: record.score,
                });
            }
            Some(_) => {}
            None => warn!(puzzle_id = puzzle.puzzle_id, "no expected score configured"),
        }

        Ok(ScenarioReport {
            deployment,
            puzzle,
            velocity,
            first_move,
            continues,
            record,
            expected_score,
            game,
            state_root: state.state_root(),
        })
    }

    /// Deploy every contract in catalog order at the configured scale.
    fn deploy(&self, state: &mut ExecutionState) -> Result<Deployment, HarnessError> {
        let mut addresses = BTreeMap::new();
        for name in CONTRACT_NAMES {
            let def = definition(name, self.config.scale)
                .ok_or_else(|| HarnessError::UnknownContract(name.to_string()))?;
            let address = state.deploy(&[], def)?;
            info!(contract = name, %address, "deployed");
            addresses.insert(name, address);
        }
        let get = |name: &str| {
            addresses
                .get(name)
                .copied()
                .ok_or_else(|| HarnessError::UnknownContract(name.to_string()))
        };
        Ok(Deployment {
            chef: get("chef")?,
            server: get("server")?,
            inventory: get("inventory")?,
            shrine: get("shrine")?,
            manager: get("manager")?,
        })
    }

    /// Final ball states as the manager stored them, decoded from the raw
    /// storage felts.
    fn stored_balls(
        state: &ExecutionState,
        manager: ContractAddress,
    ) -> Result<SystemState, HarnessError> {
        let field = state.field();
        let mut system = SystemState::default();
        for (i, ball) in system.balls.iter_mut().enumerate() {
            let mut raw = [Felt::ZERO; 6];
            for (c, slot) in raw.iter_mut().enumerate() {
                let keys = [Felt::from_u64(i as u64), Felt::from_u64(c as u64)];
                *slot = state.storage_at(manager, "ball", &keys);
            }
            *ball = decode_ball(&field, &raw)?;
        }
        Ok(system)
    }

    /// Scale the configured velocity for `puzzle_id` and encode it mod P.
    fn encode_velocity(
        &self,
        state: &ExecutionState,
        puzzle_id: u64,
    ) -> Result<(Felt, Felt), HarnessError> {
        let v = self.config.moves.velocity_for(puzzle_id);
        let scale = self.config.scale;
        let scaled = |value: i64| {
            value
                .checked_mul(scale)
                .ok_or(HarnessError::VelocityOverflow { value, scale })
        };
        let field = state.field();
        Ok((
            field.to_unsigned(scaled(v.vx)? as i128),
            field.to_unsigned(scaled(v.vy)? as i128),
        ))
    }

    /// Send `ContinueMove` until the manager has no unfinished game.
    fn drive_to_completion(
        &self,
        state: &mut ExecutionState,
        manager: &ManagerClient,
    ) -> Result<u32, HarnessError> {
        let limit = self.config.max_continue_iterations;
        let mut continues = 0;
        while manager.has_unfinished_game(state)? {
            if continues == limit {
                return Err(HarnessError::ContinueLimit { limit });
            }
            info!("manager has an unfinished game, calling ContinueMove()");
            let outcome = manager.continue_move(state, self.player())?;
            continues += 1;
            info!(
                frames_run = outcome.frames_run,
                finished = outcome.finished,
                "manager: ContinueMove() returned"
            );
        }
        info!(continues, "game has finished");
        Ok(continues)
    }
}

//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::catalog::Deployment;
use crate::clients::{InventoryClient, ManagerClient, ShrineClient};
use crate::manager::MoveOutcome;
use crate::physics::DEFAULT_SCALE;
use crate::shrine::Record;
use puzzlepool_chain::{ContractAddress, ExecutionState, StateError};

// ===========================================================================
// Accounts and constants
// ===========================================================================

pub const ADMIN: ContractAddress = ContractAddress::from_u64(1);
pub const PLAYER: ContractAddress = ContractAddress::from_u64(12345);
pub const SCALE: i64 = DEFAULT_SCALE;

/// Unscaled launch velocity used for each puzzle in the reference scenario.
pub fn reference_velocity(puzzle_id: u64) -> (i64, i64) {
    if puzzle_id == 0 { (190, 240) } else { (-100, -230) }
}

// ===========================================================================
// Game fixture
// ===========================================================================

/// A deployed, wired contract set with typed clients.
#[derive(Debug)]
pub struct GameFixture {
    pub state: ExecutionState,
    pub deployment: Deployment,
    pub manager: ManagerClient,
    pub shrine: ShrineClient,
    pub inventory: InventoryClient,
    /// Fixed-point scale the contracts were deployed with.
    pub scale: i64,
}

/// Deploy everything and run `admin_initialize_addresses` as [`ADMIN`].
pub fn wired_game() -> GameFixture {
    wired_game_in(ExecutionState::default())
}

pub fn wired_game_in(state: ExecutionState) -> GameFixture {
    wired_game_scaled(state, SCALE)
}

/// Like [`wired_game_in`], with contracts deployed at `scale`.
pub fn wired_game_scaled(mut state: ExecutionState, scale: i64) -> GameFixture {
    let deployment = Deployment::deploy(&mut state, scale).unwrap();
    let manager = ManagerClient::new(deployment.manager);
    manager
        .admin_initialize_addresses(
            &mut state,
            ADMIN,
            deployment.inventory,
            deployment.server,
            deployment.chef,
            deployment.shrine,
        )
        .unwrap();
    GameFixture {
        state,
        deployment,
        manager,
        shrine: ShrineClient::new(deployment.shrine),
        inventory: InventoryClient::new(deployment.inventory),
        scale,
    }
}

impl GameFixture {
    /// Initialize the next puzzle and return its id.
    pub fn next_puzzle(&mut self) -> u64 {
        self.manager
            .admin_initialize_puzzle(&mut self.state, ADMIN)
            .unwrap();
        self.manager
            .client_pull_puzzle(&self.state)
            .unwrap()
            .puzzle_id
    }

    /// Launch with an unscaled velocity as [`PLAYER`].
    pub fn make_move(&mut self, vx: i64, vy: i64) -> Result<MoveOutcome, StateError> {
        let field = self.state.field();
        let vx = field.to_unsigned(vx as i128 * self.scale as i128);
        let vy = field.to_unsigned(vy as i128 * self.scale as i128);
        self.manager.make_move(&mut self.state, PLAYER, vx, vy)
    }

    /// Continue until the game is settled. Returns the number of
    /// `ContinueMove` transactions sent.
    pub fn finish_game(&mut self) -> u64 {
        let mut continues = 0;
        while self.manager.has_unfinished_game(&self.state).unwrap() {
            self.manager.continue_move(&mut self.state, PLAYER).unwrap();
            continues += 1;
        }
        continues
    }

    pub fn record(&self, puzzle_id: u64) -> Record {
        self.shrine
            .view_record(&self.state, puzzle_id, PLAYER)
            .unwrap()
    }

    pub fn balance(&self) -> u64 {
        self.inventory.view_balance(&self.state, PLAYER).unwrap()
    }
}

//! Typed wrappers for invoking the game contracts.
//!
//! Each client holds an address and turns Rust arguments into calldata and
//! retdata back into Rust values. Decoding failures are reported as a
//! reverted call of the same selector.

use crate::manager::{GameView, MoveOutcome};
use crate::puzzle::PuzzleLayout;
use crate::shrine::Record;
use puzzlepool_chain::{
    CalldataReader, CalldataWriter, ContractAddress, ContractError, ExecutionState, StateError,
    TransactionReceipt,
};
use puzzlepool_felt::Felt;

fn decode<T>(
    state: &ExecutionState,
    address: ContractAddress,
    selector: &str,
    retdata: &[Felt],
    f: impl FnOnce(&mut CalldataReader<'_>) -> Result<T, ContractError>,
) -> Result<T, StateError> {
    let mut r = CalldataReader::new(state.field(), retdata);
    f(&mut r)
        .and_then(|value| r.finish().map(|()| value))
        .map_err(|source| StateError::Execution {
            address,
            selector: selector.to_string(),
            source,
        })
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// A puzzle as handed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulledPuzzle {
    pub puzzle_id: u64,
    pub layout: PuzzleLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerClient {
    pub address: ContractAddress,
}

impl ManagerClient {
    pub fn new(address: ContractAddress) -> Self {
        Self { address }
    }

    pub fn admin_initialize_addresses(
        &self,
        state: &mut ExecutionState,
        caller: ContractAddress,
        inventory: ContractAddress,
        server: ContractAddress,
        chef: ContractAddress,
        shrine: ContractAddress,
    ) -> Result<TransactionReceipt, StateError> {
        let calldata = CalldataWriter::new(state.field())
            .address(inventory)
            .address(server)
            .address(chef)
            .address(shrine)
            .finish();
        state.invoke(caller, self.address, "admin_initialize_addresses", &calldata)
    }

    pub fn admin_initialize_puzzle(
        &self,
        state: &mut ExecutionState,
        caller: ContractAddress,
    ) -> Result<TransactionReceipt, StateError> {
        state.invoke(caller, self.address, "admin_initialize_puzzle", &[])
    }

    pub fn client_pull_puzzle(&self, state: &ExecutionState) -> Result<PulledPuzzle, StateError> {
        let selector = "client_pull_puzzle";
        let ret = state.call(self.address, selector, &[])?;
        decode(state, self.address, selector, &ret, |r| {
            Ok(PulledPuzzle {
                puzzle_id: r.next_u64()?,
                layout: r.next()?,
            })
        })
    }

    /// Launch the player ball. `vx` and `vy` are already field-encoded.
    pub fn make_move(
        &self,
        state: &mut ExecutionState,
        caller: ContractAddress,
        vx: Felt,
        vy: Felt,
    ) -> Result<MoveOutcome, StateError> {
        let selector = "MakeMove";
        let receipt = state.invoke(caller, self.address, selector, &[vx, vy])?;
        decode(state, self.address, selector, &receipt.retdata, |r| r.next())
    }

    pub fn has_unfinished_game(&self, state: &ExecutionState) -> Result<bool, StateError> {
        let selector = "client_poll_if_manager_has_unfinished_game";
        let ret = state.call(self.address, selector, &[])?;
        decode(state, self.address, selector, &ret, |r| r.next_bool())
    }

    pub fn continue_move(
        &self,
        state: &mut ExecutionState,
        caller: ContractAddress,
    ) -> Result<MoveOutcome, StateError> {
        let selector = "ContinueMove";
        let receipt = state.invoke(caller, self.address, selector, &[])?;
        decode(state, self.address, selector, &receipt.retdata, |r| r.next())
    }

    pub fn view_game(&self, state: &ExecutionState) -> Result<GameView, StateError> {
        let selector = "client_view_game";
        let ret = state.call(self.address, selector, &[])?;
        decode(state, self.address, selector, &ret, |r| r.next())
    }
}

// ---------------------------------------------------------------------------
// Shrine and inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShrineClient {
    pub address: ContractAddress,
}

impl ShrineClient {
    pub fn new(address: ContractAddress) -> Self {
        Self { address }
    }

    pub fn view_record(
        &self,
        state: &ExecutionState,
        puzzle_id: u64,
        player: ContractAddress,
    ) -> Result<Record, StateError> {
        let selector = "view_record";
        let calldata = CalldataWriter::new(state.field())
            .u64(puzzle_id)
            .address(player)
            .finish();
        let ret = state.call(self.address, selector, &calldata)?;
        decode(state, self.address, selector, &ret, |r| r.next())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryClient {
    pub address: ContractAddress,
}

impl InventoryClient {
    pub fn new(address: ContractAddress) -> Self {
        Self { address }
    }

    pub fn view_balance(
        &self,
        state: &ExecutionState,
        player: ContractAddress,
    ) -> Result<u64, StateError> {
        let selector = "view_balance";
        let calldata = CalldataWriter::new(state.field()).address(player).finish();
        let ret = state.call(self.address, selector, &calldata)?;
        decode(state, self.address, selector, &ret, |r| r.next_u64())
    }
}

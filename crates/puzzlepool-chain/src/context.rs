//! Execution context handed to contract code.
//!
//! An [`ExecutionContext`] scopes storage access to the executing contract,
//! meters steps against the transaction budget, and routes nested calls.

use crate::config::ChainConfig;
use crate::contract::{ContractDefinition, ContractError, EntryPointKind};
use crate::event::Event;
use crate::id::ContractAddress;
use crate::storage::{Storage, StorageKey};
use puzzlepool_felt::{Felt, Field};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Everything a transaction can change. Cloned before execution so a failed
/// transaction can be discarded wholesale.
#[derive(Debug, Clone, Default)]
pub(crate) struct World {
    pub(crate) contracts: BTreeMap<ContractAddress, ContractDefinition>,
    pub(crate) storage: BTreeMap<ContractAddress, Storage>,
    pub(crate) events: Vec<Event>,
}

// ---------------------------------------------------------------------------
// Step meter
// ---------------------------------------------------------------------------

/// Counts execution steps against a fixed budget.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StepMeter {
    used: u64,
    limit: u64,
}

impl StepMeter {
    pub(crate) fn new(limit: u64) -> Self {
        Self { used: 0, limit }
    }

    pub(crate) fn used(&self) -> u64 {
        self.used
    }

    fn charge(&mut self, steps: u64) -> Result<(), ContractError> {
        self.used = self.used.saturating_add(steps);
        if self.used > self.limit {
            return Err(ContractError::OutOfResources {
                used: self.used,
                limit: self.limit,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Call frame
// ---------------------------------------------------------------------------

/// Who is calling whom, and under which restrictions.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub(crate) caller: ContractAddress,
    pub(crate) to: ContractAddress,
    pub(crate) depth: u32,
    pub(crate) read_only: bool,
}

/// Enter `selector` on `frame.to`: check depth, charge the base cost,
/// resolve the entry point, then run the code.
pub(crate) fn dispatch(
    world: &mut World,
    meter: &mut StepMeter,
    config: &ChainConfig,
    block_number: u64,
    frame: Frame,
    selector: &str,
    calldata: &[Felt],
) -> Result<Vec<Felt>, ContractError> {
    if frame.depth > config.max_call_depth {
        return Err(ContractError::CallDepthExceeded {
            depth: frame.depth,
            limit: config.max_call_depth,
        });
    }
    meter.charge(config.base_call_cost)?;

    let code = world
        .contracts
        .get(&frame.to)
        .cloned()
        .ok_or(ContractError::ContractNotFound(frame.to))?;
    let entry = code
        .entry_point(selector)
        .ok_or_else(|| ContractError::UnknownEntryPoint {
            contract: code.name().to_string(),
            selector: selector.to_string(),
        })?;

    tracing::trace!(
        contract = code.name(),
        selector,
        depth = frame.depth,
        calldata_len = calldata.len(),
        "entering contract"
    );

    let mut ctx = ExecutionContext {
        world,
        meter,
        config,
        block_number,
        contract_address: frame.to,
        caller_address: frame.caller,
        depth: frame.depth,
        read_only: frame.read_only || entry.kind == EntryPointKind::View,
    };
    code.execute(&mut ctx, selector, calldata)
}

// ---------------------------------------------------------------------------
// ExecutionContext
// ---------------------------------------------------------------------------

/// Mutable context passed to contract entry points.
///
/// Provides the executing contract's storage, the caller's address, the
/// configured [`Field`], step metering, events, and nested calls.
pub struct ExecutionContext<'a> {
    world: &'a mut World,
    meter: &'a mut StepMeter,
    config: &'a ChainConfig,
    block_number: u64,
    contract_address: ContractAddress,
    caller_address: ContractAddress,
    depth: u32,
    read_only: bool,
}

impl<'a> ExecutionContext<'a> {
    /// Context for a constructor run at deployment.
    pub(crate) fn for_constructor(
        world: &'a mut World,
        meter: &'a mut StepMeter,
        config: &'a ChainConfig,
        block_number: u64,
        contract_address: ContractAddress,
    ) -> Self {
        Self {
            world,
            meter,
            config,
            block_number,
            contract_address,
            caller_address: ContractAddress::ZERO,
            depth: 0,
            read_only: false,
        }
    }

    // -----------------------------------------------------------------------
    // Environment
    // -----------------------------------------------------------------------

    /// Address of the contract being executed.
    pub fn contract_address(&self) -> ContractAddress {
        self.contract_address
    }

    /// Address of the account or contract that made this call.
    pub fn caller_address(&self) -> ContractAddress {
        self.caller_address
    }

    pub fn field(&self) -> Field {
        self.config.field
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Charge `steps` against the transaction budget.
    pub fn consume_steps(&mut self, steps: u64) -> Result<(), ContractError> {
        self.meter.charge(steps)
    }

    pub fn steps_used(&self) -> u64 {
        self.meter.used()
    }

    // -----------------------------------------------------------------------
    // Storage
    // -----------------------------------------------------------------------

    pub fn storage_read(&self, var: &str, keys: &[Felt]) -> Felt {
        self.world
            .storage
            .get(&self.contract_address)
            .map(|s| s.read(&StorageKey::new(var, keys)))
            .unwrap_or(Felt::ZERO)
    }

    pub fn storage_write(
        &mut self,
        var: &str,
        keys: &[Felt],
        value: Felt,
    ) -> Result<(), ContractError> {
        if self.read_only {
            return Err(ContractError::WriteInView {
                contract: self.contract_address,
            });
        }
        self.world
            .storage
            .entry(self.contract_address)
            .or_default()
            .write(StorageKey::new(var, keys), value);
        Ok(())
    }

    pub fn read_i64(&self, var: &str, keys: &[Felt]) -> Result<i64, ContractError> {
        Ok(self.field().decode_i64(self.storage_read(var, keys))?)
    }

    pub fn write_i64(&mut self, var: &str, keys: &[Felt], value: i64) -> Result<(), ContractError> {
        let felt = self.field().to_unsigned(value as i128);
        self.storage_write(var, keys, felt)
    }

    pub fn read_u64(&self, var: &str, keys: &[Felt]) -> Result<u64, ContractError> {
        let raw = self.storage_read(var, keys);
        raw.to_u64().ok_or_else(|| {
            ContractError::assertion(format!("storage slot '{var}' does not hold a u64"))
        })
    }

    pub fn write_u64(&mut self, var: &str, keys: &[Felt], value: u64) -> Result<(), ContractError> {
        let felt = self.field().encode_u64(value);
        self.storage_write(var, keys, felt)
    }

    pub fn read_bool(&self, var: &str, keys: &[Felt]) -> bool {
        !self.storage_read(var, keys).is_zero()
    }

    pub fn write_bool(
        &mut self,
        var: &str,
        keys: &[Felt],
        value: bool,
    ) -> Result<(), ContractError> {
        self.storage_write(var, keys, if value { Felt::ONE } else { Felt::ZERO })
    }

    pub fn read_address(&self, var: &str, keys: &[Felt]) -> ContractAddress {
        ContractAddress(self.storage_read(var, keys))
    }

    pub fn write_address(
        &mut self,
        var: &str,
        keys: &[Felt],
        value: ContractAddress,
    ) -> Result<(), ContractError> {
        self.storage_write(var, keys, value.felt())
    }

    // -----------------------------------------------------------------------
    // Events and calls
    // -----------------------------------------------------------------------

    /// Emit an event. Kept only if the transaction succeeds.
    pub fn emit_event(
        &mut self,
        name: &str,
        keys: Vec<Felt>,
        data: Vec<Felt>,
    ) -> Result<(), ContractError> {
        if self.read_only {
            return Err(ContractError::WriteInView {
                contract: self.contract_address,
            });
        }
        self.world.events.push(Event {
            from_address: self.contract_address,
            name: name.to_string(),
            keys,
            data,
        });
        Ok(())
    }

    /// Call another contract. The callee sees this contract as its caller
    /// and inherits read-only mode.
    pub fn call_contract(
        &mut self,
        to: ContractAddress,
        selector: &str,
        calldata: &[Felt],
    ) -> Result<Vec<Felt>, ContractError> {
        let frame = Frame {
            caller: self.contract_address,
            to,
            depth: self.depth + 1,
            read_only: self.read_only,
        };
        dispatch(
            &mut *self.world,
            &mut *self.meter,
            self.config,
            self.block_number,
            frame,
            selector,
            calldata,
        )
    }
}

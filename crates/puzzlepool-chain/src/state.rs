//! The execution state: deployed contracts, their storage, and the
//! transaction entry points (`deploy`, `invoke`, `call`).
//!
//! # Atomicity
//!
//! Every transaction executes against a scratch copy of the world. The copy
//! replaces the live world only if execution returns `Ok`; on any error the
//! scratch copy is dropped, so a reverted transaction leaves no storage
//! writes and no events behind. `call` always drops its copy.

use crate::config::ChainConfig;
use crate::context::{ExecutionContext, Frame, StepMeter, World, dispatch};
use crate::contract::{ContractDefinition, ContractError};
use crate::event::Event;
use crate::hash::StateHash;
use crate::history::{TransactionLog, TransactionRecord, TxOutcome};
use crate::id::ContractAddress;
use crate::storage::{Storage, StorageKey};
use puzzlepool_felt::{Felt, Field};
use std::collections::BTreeMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the execution state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// The constructor of a contract failed.
    #[error("deploying '{name}' failed: {source}")]
    Deploy {
        name: String,
        #[source]
        source: ContractError,
    },

    /// A derived address is already occupied.
    #[error("address {0} is already in use")]
    AddressCollision(ContractAddress),

    /// A transaction or call reverted.
    #[error("{selector} on {address} reverted: {source}")]
    Execution {
        address: ContractAddress,
        selector: String,
        #[source]
        source: ContractError,
    },
}

impl StateError {
    /// The contract-level error behind this failure, if any.
    pub fn contract_error(&self) -> Option<&ContractError> {
        match self {
            StateError::Deploy { source, .. } | StateError::Execution { source, .. } => {
                Some(source)
            }
            StateError::AddressCollision(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

/// Result of a successful `invoke`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub index: u64,
    pub block_number: u64,
    pub retdata: Vec<Felt>,
    pub events: Vec<Event>,
    pub steps_used: u64,
}

// ---------------------------------------------------------------------------
// ExecutionState
// ---------------------------------------------------------------------------

/// An isolated, in-process execution environment.
#[derive(Debug)]
pub struct ExecutionState {
    config: ChainConfig,
    pub(crate) world: World,
    pub(crate) block_number: u64,
    pub(crate) deploy_nonce: u64,
    next_tx_index: u64,
    history: TransactionLog,
}

impl ExecutionState {
    /// A fresh state with nothing deployed.
    pub fn empty(config: ChainConfig) -> Self {
        let history = TransactionLog::with_max_history(config.max_history);
        Self {
            config,
            world: World::default(),
            block_number: 0,
            deploy_nonce: 0,
            next_tx_index: 0,
            history,
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn field(&self) -> Field {
        self.config.field
    }

    /// Number of blocks produced. Each successful invoke produces one.
    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    // -----------------------------------------------------------------------
    // Deployment
    // -----------------------------------------------------------------------

    /// Deploy `definition`, running its constructor with
    /// `constructor_calldata`. Returns the new contract's address.
    pub fn deploy(
        &mut self,
        constructor_calldata: &[Felt],
        definition: ContractDefinition,
    ) -> Result<ContractAddress, StateError> {
        let name = definition.name().to_string();
        let address = ContractAddress::derive(self.deploy_nonce, &name);
        if self.world.contracts.contains_key(&address) {
            return Err(StateError::AddressCollision(address));
        }

        let mut scratch = self.world.clone();
        scratch.contracts.insert(address, Arc::clone(&definition));
        scratch.storage.insert(address, Storage::new());

        let mut meter = StepMeter::new(self.config.max_steps_per_tx);
        let mut ctx = ExecutionContext::for_constructor(
            &mut scratch,
            &mut meter,
            &self.config,
            self.block_number,
            address,
        );
        definition
            .constructor(&mut ctx, constructor_calldata)
            .map_err(|source| StateError::Deploy {
                name: name.clone(),
                source,
            })?;

        self.world = scratch;
        self.deploy_nonce += 1;
        tracing::debug!(contract = %name, %address, "contract deployed");
        Ok(address)
    }

    /// Whether a contract is deployed at `address`.
    pub fn is_deployed(&self, address: ContractAddress) -> bool {
        self.world.contracts.contains_key(&address)
    }

    /// Name of the contract deployed at `address`.
    pub fn contract_name(&self, address: ContractAddress) -> Option<&str> {
        self.world.contracts.get(&address).map(|c| c.name())
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    /// Execute `selector` on `to` as a transaction sent by `caller`.
    ///
    /// State changes and events persist only if execution succeeds.
    pub fn invoke(
        &mut self,
        caller: ContractAddress,
        to: ContractAddress,
        selector: &str,
        calldata: &[Felt],
    ) -> Result<TransactionReceipt, StateError> {
        let index = self.next_tx_index;
        self.next_tx_index += 1;
        let block_number = self.block_number + 1;

        let mut scratch = self.world.clone();
        let events_before = scratch.events.len();
        let mut meter = StepMeter::new(self.config.max_steps_per_tx);
        let frame = Frame {
            caller,
            to,
            depth: 0,
            read_only: false,
        };
        let result = dispatch(
            &mut scratch,
            &mut meter,
            &self.config,
            block_number,
            frame,
            selector,
            calldata,
        );

        match result {
            Ok(retdata) => {
                let events = scratch.events[events_before..].to_vec();
                let steps_used = meter.used();
                self.world = scratch;
                self.block_number = block_number;
                tracing::debug!(index, %to, selector, steps_used, "transaction succeeded");
                self.history.record(TransactionRecord {
                    index,
                    caller,
                    to,
                    selector: selector.to_string(),
                    outcome: TxOutcome::Succeeded { steps_used },
                });
                Ok(TransactionReceipt {
                    index,
                    block_number,
                    retdata,
                    events,
                    steps_used,
                })
            }
            Err(source) => {
                tracing::debug!(index, %to, selector, error = %source, "transaction reverted");
                self.history.record(TransactionRecord {
                    index,
                    caller,
                    to,
                    selector: selector.to_string(),
                    outcome: TxOutcome::Reverted {
                        reason: source.to_string(),
                    },
                });
                Err(StateError::Execution {
                    address: to,
                    selector: selector.to_string(),
                    source,
                })
            }
        }
    }

    /// Execute `selector` on `to` without persisting anything.
    pub fn call(
        &self,
        to: ContractAddress,
        selector: &str,
        calldata: &[Felt],
    ) -> Result<Vec<Felt>, StateError> {
        let mut scratch = self.world.clone();
        let mut meter = StepMeter::new(self.config.max_steps_per_tx);
        let frame = Frame {
            caller: ContractAddress::ZERO,
            to,
            depth: 0,
            read_only: false,
        };
        dispatch(
            &mut scratch,
            &mut meter,
            &self.config,
            self.block_number,
            frame,
            selector,
            calldata,
        )
        .map_err(|source| StateError::Execution {
            address: to,
            selector: selector.to_string(),
            source,
        })
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Raw storage slot of a deployed contract.
    pub fn storage_at(&self, address: ContractAddress, var: &str, keys: &[Felt]) -> Felt {
        self.world
            .storage
            .get(&address)
            .map(|s| s.read(&StorageKey::new(var, keys)))
            .unwrap_or(Felt::ZERO)
    }

    /// Full storage of a deployed contract.
    pub fn storage_of(&self, address: ContractAddress) -> Option<&Storage> {
        self.world.storage.get(&address)
    }

    /// All events from successful transactions, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.world.events
    }

    /// Recent transaction records, including reverted ones.
    pub fn transactions(&self) -> &TransactionLog {
        &self.history
    }

    /// Digest of all contract storage. Equal digests mean equal storage.
    pub fn state_root(&self) -> u64 {
        let mut h = StateHash::new();
        for (address, storage) in &self.world.storage {
            h.write_felt(address.felt());
            h.write_u64(storage.len() as u64);
            for (key, value) in storage.iter() {
                h.write_str(&key.var);
                h.write_u64(key.keys.len() as u64);
                for k in &key.keys {
                    h.write_felt(*k);
                }
                h.write_felt(*value);
            }
        }
        h.finish()
    }

    /// Deployed addresses with their contract names.
    pub fn deployed(&self) -> BTreeMap<ContractAddress, String> {
        self.world
            .contracts
            .iter()
            .map(|(addr, c)| (*addr, c.name().to_string()))
            .collect()
    }
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self::empty(ChainConfig::default())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

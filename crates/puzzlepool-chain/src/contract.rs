//! The contract seam: code deployed into an [`ExecutionState`].
//!
//! Contract code is stateless. Everything a contract remembers lives in its
//! [`Storage`], reached through the [`ExecutionContext`] passed to every
//! entry point. This keeps nested calls (A calls B calls C) free of aliasing:
//! the context re-borrows the world for the callee and hands it back when
//! the call returns.
//!
//! [`ExecutionState`]: crate::state::ExecutionState
//! [`Storage`]: crate::storage::Storage
//! [`ExecutionContext`]: crate::context::ExecutionContext

use crate::context::ExecutionContext;
use crate::id::ContractAddress;
use puzzlepool_felt::{Felt, FieldError};
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Whether an entry point may write storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPointKind {
    /// May write storage and emit events.
    External,
    /// Read-only. Any storage write fails with [`ContractError::WriteInView`].
    View,
}

/// A named function exposed by a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: &'static str,
    pub kind: EntryPointKind,
}

impl EntryPoint {
    pub const fn external(name: &'static str) -> Self {
        Self {
            name,
            kind: EntryPointKind::External,
        }
    }

    pub const fn view(name: &'static str) -> Self {
        Self {
            name,
            kind: EntryPointKind::View,
        }
    }
}

// ---------------------------------------------------------------------------
// Contract trait
// ---------------------------------------------------------------------------

/// Code that can be deployed and executed.
///
/// Implementors list their entry points once; the execution state rejects
/// selectors that are not listed before `execute` is ever called, so the
/// `match` inside `execute` only needs a catch-all for completeness.
pub trait Contract: fmt::Debug + Send + Sync {
    /// Human-readable contract name, also used for address derivation.
    fn name(&self) -> &str;

    /// The callable surface of this contract.
    fn entry_points(&self) -> &[EntryPoint];

    /// Runs once at deployment. The default accepts only empty calldata.
    fn constructor(
        &self,
        _ctx: &mut ExecutionContext<'_>,
        calldata: &[Felt],
    ) -> Result<(), ContractError> {
        if calldata.is_empty() {
            Ok(())
        } else {
            Err(ContractError::TrailingCalldata {
                consumed: 0,
                got: calldata.len(),
            })
        }
    }

    /// Execute the entry point named `selector`.
    fn execute(
        &self,
        ctx: &mut ExecutionContext<'_>,
        selector: &str,
        calldata: &[Felt],
    ) -> Result<Vec<Felt>, ContractError>;

    /// Look up an entry point by name.
    fn entry_point(&self, selector: &str) -> Option<EntryPoint> {
        self.entry_points()
            .iter()
            .find(|ep| ep.name == selector)
            .copied()
    }
}

/// A deployable contract definition. Shared, because the same code may be
/// deployed at several addresses.
pub type ContractDefinition = Arc<dyn Contract>;

// ---------------------------------------------------------------------------
// ContractError
// ---------------------------------------------------------------------------

/// Errors raised while executing contract code. Any of these reverts the
/// enclosing transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// The selector is not one of the contract's entry points.
    #[error("contract '{contract}' has no entry point '{selector}'")]
    UnknownEntryPoint { contract: String, selector: String },

    /// No contract is deployed at the address.
    #[error("no contract deployed at {0}")]
    ContractNotFound(ContractAddress),

    /// Calldata ended before the entry point read all its arguments.
    #[error("calldata too short: needed {needed} felts, got {got}")]
    CalldataTooShort { needed: usize, got: usize },

    /// Calldata had more felts than the entry point consumed.
    #[error("trailing calldata: consumed {consumed} of {got} felts")]
    TrailingCalldata { consumed: usize, got: usize },

    /// The transaction ran out of execution steps.
    #[error("out of resources: {used} steps used, limit is {limit}")]
    OutOfResources { used: u64, limit: u64 },

    /// Nested calls went deeper than the configured limit.
    #[error("call depth {depth} exceeds limit {limit}")]
    CallDepthExceeded { depth: u32, limit: u32 },

    /// A view entry point attempted a storage write.
    #[error("storage write in view context of {contract}")]
    WriteInView { contract: ContractAddress },

    /// A felt could not be decoded.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// A contract-level check failed.
    #[error("assertion failed: {0}")]
    Assertion(String),
}

impl ContractError {
    pub fn assertion(msg: impl Into<String>) -> Self {
        Self::Assertion(msg.into())
    }
}

/// Fail with [`ContractError::Assertion`] unless `cond` holds.
pub fn ensure(cond: bool, msg: &str) -> Result<(), ContractError> {
    if cond {
        Ok(())
    } else {
        Err(ContractError::assertion(msg))
    }
}

//! Puzzlepool Chain -- an in-process contract execution environment.
//!
//! Contracts are Rust types implementing [`contract::Contract`]. They are
//! deployed into an [`state::ExecutionState`], which gives each one its own
//! felt-valued [`storage::Storage`] and runs transactions against it.
//!
//! # Transaction Semantics
//!
//! - **invoke** -- executes on a scratch copy of the world; the copy is
//!   committed only if execution succeeds. Reverts leave no trace except a
//!   record in the [`history::TransactionLog`].
//! - **call** -- executes and discards every change. Used for views.
//! - **deploy** -- derives an address from a nonce and the contract name,
//!   then runs the constructor under the same all-or-nothing rule.
//!
//! Every transaction carries a step budget ([`config::ChainConfig`]).
//! Contracts charge steps through [`context::ExecutionContext`]; exceeding
//! the budget reverts with [`contract::ContractError::OutOfResources`].
//!
//! # Key Types
//!
//! - [`state::ExecutionState`] -- deploy, invoke, call, inspect.
//! - [`context::ExecutionContext`] -- what a running contract can do.
//! - [`calldata::CalldataReader`] / [`calldata::CalldataWriter`] -- signed
//!   and unsigned values to and from felts.

pub mod calldata;
pub mod config;
pub mod context;
pub mod contract;
pub mod event;
pub mod hash;
pub mod history;
pub mod id;
pub mod serialize;
pub mod state;
pub mod storage;

pub use calldata::{CalldataReader, CalldataWriter, WireFormat};
pub use config::ChainConfig;
pub use context::ExecutionContext;
pub use contract::{Contract, ContractDefinition, ContractError, EntryPoint, EntryPointKind, ensure};
pub use event::Event;
pub use id::ContractAddress;
pub use state::{ExecutionState, StateError, TransactionReceipt};

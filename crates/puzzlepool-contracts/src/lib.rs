//! Puzzlepool Contracts -- the game deployed into the execution environment.
//!
//! Five contracts cooperate through calls:
//!
//! - [`chef::Chef`] -- computes one physics frame (`euler_forward`).
//! - [`server::Server`] -- puzzle catalog, chunked simulation, scoring.
//! - [`shrine::Shrine`] -- best score per puzzle and player.
//! - [`inventory::Inventory`] -- reward balances.
//! - [`manager::Manager`] -- the game session that ties them together.
//!
//! A move is too expensive for one transaction. The manager simulates
//! `frames_per_tx` frames per transaction and reports an unfinished game
//! until the server says the game is over; the client keeps sending
//! `ContinueMove` until then.

mod access;
pub mod catalog;
pub mod chef;
pub mod clients;
pub mod inventory;
pub mod manager;
pub mod physics;
pub mod puzzle;
pub mod server;
pub mod shrine;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use catalog::{CONTRACT_NAMES, Deployment, definition};
pub use clients::{InventoryClient, ManagerClient, PulledPuzzle, ShrineClient};
pub use manager::{GameView, MoveOutcome};
pub use physics::{BallState, DEFAULT_SCALE, PhysicsParams, SystemState, TouchedMask};
pub use shrine::Record;

//! Puzzlepool Harness -- end-to-end orchestration of the puzzle game.
//!
//! Deploys the five game contracts into a fresh in-process execution state,
//! wires them together, plays one move across as many transactions as the
//! step budget requires, and checks the score recorded at the shrine.
//!
//! Velocities are given unscaled in the [`config::HarnessConfig`]; the
//! harness multiplies them by the fixed-point scale and encodes negative
//! values as `P - |v|` before sending them.

pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod scenario;

pub use config::{ConfigError, HarnessConfig};
pub use error::HarnessError;
pub use logging::init_logging;
pub use scenario::{Scenario, ScenarioReport};

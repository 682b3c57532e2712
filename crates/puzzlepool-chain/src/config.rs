use puzzlepool_felt::Field;
use serde::{Deserialize, Serialize};

/// Limits and parameters of the simulated execution environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Field all calldata is encoded in.
    pub field: Field,
    /// Step budget of a single transaction or call.
    pub max_steps_per_tx: u64,
    /// Steps charged for entering any entry point.
    pub base_call_cost: u64,
    /// Maximum nesting of contract-to-contract calls.
    pub max_call_depth: u32,
    /// Transaction records retained in the history. 0 = no history.
    pub max_history: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            field: Field::stark(),
            max_steps_per_tx: 1_000_000,
            base_call_cost: 100,
            max_call_depth: 8,
            max_history: 256,
        }
    }
}

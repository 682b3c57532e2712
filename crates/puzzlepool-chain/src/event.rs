use crate::id::ContractAddress;
use puzzlepool_felt::Felt;
use serde::{Deserialize, Serialize};

/// An event emitted by a contract during a successful transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub from_address: ContractAddress,
    pub name: String,
    pub keys: Vec<Felt>,
    pub data: Vec<Felt>,
}

impl Event {
    /// Whether this event was emitted by `address` under `name`.
    pub fn is(&self, address: ContractAddress, name: &str) -> bool {
        self.from_address == address && self.name == name
    }
}

use crate::hash::StateHash;
use puzzlepool_felt::Felt;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a deployed contract or an externally owned account.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractAddress(pub Felt);

impl ContractAddress {
    /// The zero address, used as the caller of constructors.
    pub const ZERO: ContractAddress = ContractAddress(Felt::ZERO);

    pub const fn from_u64(v: u64) -> Self {
        Self(Felt::from_u64(v))
    }

    pub const fn felt(&self) -> Felt {
        self.0
    }

    /// Derive the address for the `nonce`-th deployment of `contract_name`.
    pub fn derive(nonce: u64, contract_name: &str) -> Self {
        let mut h = StateHash::new();
        h.write_str("deploy");
        h.write_u64(nonce);
        h.write_str(contract_name);
        Self(Felt::from_u64(h.finish()))
    }
}

impl From<Felt> for ContractAddress {
    fn from(v: Felt) -> Self {
        Self(v)
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::Debug for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractAddress({:#x})", self.0)
    }
}

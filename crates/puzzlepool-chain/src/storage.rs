//! Per-contract key/value storage.
//!
//! Slots are addressed by a variable name plus zero or more key felts, the
//! same shape as a mapping `var[k0][k1]...`. Unwritten slots read as zero.

use puzzlepool_felt::Felt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Address of a single storage slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StorageKey {
    pub var: String,
    pub keys: Vec<Felt>,
}

impl StorageKey {
    pub fn new(var: &str, keys: &[Felt]) -> Self {
        Self {
            var: var.to_string(),
            keys: keys.to_vec(),
        }
    }
}

/// Storage owned by one deployed contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    slots: BTreeMap<StorageKey, Felt>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a slot. Unwritten slots are zero.
    pub fn read(&self, key: &StorageKey) -> Felt {
        self.slots.get(key).copied().unwrap_or(Felt::ZERO)
    }

    /// Write a slot. Writing zero clears it, so empty storage compares equal
    /// regardless of history.
    pub fn write(&mut self, key: StorageKey, value: Felt) {
        if value.is_zero() {
            self.slots.remove(&key);
        } else {
            self.slots.insert(key, value);
        }
    }

    /// Number of non-zero slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate non-zero slots in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&StorageKey, &Felt)> {
        self.slots.iter()
    }
}

//! Binary snapshots of contract storage.
//!
//! Contract code is not serializable, so a snapshot carries storage, events
//! and counters only. Restoring requires the same contracts to be deployed
//! at the same addresses; the snapshot records each contract's name and the
//! restore fails if the live deployment holds a different set of contracts.

use crate::event::Event;
use crate::id::ContractAddress;
use crate::state::ExecutionState;
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a storage snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x5054_5001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("snapshot expects '{expected}' at {address}, found {found:?}")]
    ContractMismatch {
        address: ContractAddress,
        expected: String,
        found: Option<String>,
    },
    #[error("'{name}' at {address} is deployed but absent from the snapshot")]
    UnexpectedContract {
        address: ContractAddress,
        name: String,
    },
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Block number at the time the snapshot was taken.
    pub block_number: u64,
}

impl SnapshotHeader {
    pub fn new(block_number: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            block_number,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StorageSnapshot {
    header: SnapshotHeader,
    deploy_nonce: u64,
    contracts: BTreeMap<ContractAddress, String>,
    storage: BTreeMap<ContractAddress, Storage>,
    events: Vec<Event>,
}

/// Decode only the header of a snapshot.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    let snapshot: StorageSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

// ---------------------------------------------------------------------------
// ExecutionState snapshot methods
// ---------------------------------------------------------------------------

impl ExecutionState {
    /// Serialize all contract storage and events.
    pub fn snapshot_storage(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = StorageSnapshot {
            header: SnapshotHeader::new(self.block_number),
            deploy_nonce: self.deploy_nonce,
            contracts: self.deployed(),
            storage: self.world.storage.clone(),
            events: self.world.events.clone(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Replace storage and events with a snapshot's contents.
    ///
    /// The live deployment must match the snapshot's exactly: every
    /// recorded contract deployed here under the same name, and nothing
    /// else. On error the state is left untouched.
    pub fn restore_storage(&mut self, data: &[u8]) -> Result<(), DeserializeError> {
        let snapshot: StorageSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;

        for (address, expected) in &snapshot.contracts {
            let found = self.contract_name(*address);
            if found != Some(expected.as_str()) {
                return Err(DeserializeError::ContractMismatch {
                    address: *address,
                    expected: expected.clone(),
                    found: found.map(str::to_string),
                });
            }
        }
        if let Some((address, name)) = self
            .deployed()
            .into_iter()
            .find(|(address, _)| !snapshot.contracts.contains_key(address))
        {
            return Err(DeserializeError::UnexpectedContract { address, name });
        }

        self.world.storage = snapshot.storage;
        self.world.events = snapshot.events;
        self.block_number = snapshot.header.block_number;
        self.deploy_nonce = self.deploy_nonce.max(snapshot.deploy_nonce);
        tracing::debug!(block_number = self.block_number, "storage restored");
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;
    use crate::contract::{Contract, ContractError, EntryPoint};
    use puzzlepool_felt::Felt;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Register(&'static str);

    const REGISTER_ENTRY_POINTS: &[EntryPoint] = &[EntryPoint::external("set")];

    impl Contract for Register {
        fn name(&self) -> &str {
            self.0
        }

        fn entry_points(&self) -> &[EntryPoint] {
            REGISTER_ENTRY_POINTS
        }

        fn execute(
            &self,
            ctx: &mut ExecutionContext<'_>,
            _selector: &str,
            calldata: &[Felt],
        ) -> Result<Vec<Felt>, ContractError> {
            let value = calldata.first().copied().unwrap_or(Felt::ZERO);
            ctx.storage_write("value", &[], value)?;
            Ok(vec![])
        }
    }

    const USER: ContractAddress = ContractAddress::from_u64(1);

    fn deployed(name: &'static str) -> (ExecutionState, ContractAddress) {
        let mut state = ExecutionState::default();
        let addr = state.deploy(&[], Arc::new(Register(name))).unwrap();
        (state, addr)
    }

    #[test]
    fn snapshot_restores_storage() {
        let (mut state, addr) = deployed("register");
        state.invoke(USER, addr, "set", &[Felt::from_u64(45)]).unwrap();
        let data = state.snapshot_storage().unwrap();
        let root = state.state_root();

        state.invoke(USER, addr, "set", &[Felt::from_u64(7)]).unwrap();
        assert_ne!(state.state_root(), root);

        state.restore_storage(&data).unwrap();
        assert_eq!(state.state_root(), root);
        assert_eq!(state.storage_at(addr, "value", &[]), Felt::from_u64(45));
        assert_eq!(state.block_number(), 1);
    }

    #[test]
    fn snapshot_restores_into_fresh_deployment() {
        let (mut state, addr) = deployed("register");
        state.invoke(USER, addr, "set", &[Felt::from_u64(3)]).unwrap();
        let data = state.snapshot_storage().unwrap();

        let (mut fresh, fresh_addr) = deployed("register");
        assert_eq!(fresh_addr, addr);
        fresh.restore_storage(&data).unwrap();
        assert_eq!(fresh.state_root(), state.state_root());
    }

    #[test]
    fn restore_rejects_different_contracts() {
        let (mut state, _) = deployed("register");
        state.deploy(&[], Arc::new(Register("other"))).unwrap();
        let data = state.snapshot_storage().unwrap();

        let (mut fresh, _) = deployed("register");
        assert!(matches!(
            fresh.restore_storage(&data),
            Err(DeserializeError::ContractMismatch { found: None, .. })
        ));
    }

    #[test]
    fn restore_rejects_extra_live_contracts() {
        let (state, _) = deployed("register");
        let data = state.snapshot_storage().unwrap();

        let (mut wider, _) = deployed("register");
        let extra = wider.deploy(&[], Arc::new(Register("other"))).unwrap();
        wider.invoke(USER, extra, "set", &[Felt::from_u64(9)]).unwrap();
        let root = wider.state_root();

        let err = wider.restore_storage(&data).unwrap_err();
        assert!(matches!(
            err,
            DeserializeError::UnexpectedContract { address, ref name }
                if address == extra && name == "other"
        ));
        assert_eq!(wider.state_root(), root);
        assert_eq!(wider.storage_at(extra, "value", &[]), Felt::from_u64(9));
    }

    #[test]
    fn header_is_validated() {
        let (state, _) = deployed("register");
        let data = state.snapshot_storage().unwrap();
        let header = read_snapshot_header(&data).unwrap();
        assert_eq!(header, SnapshotHeader::new(0));

        let bad = SnapshotHeader {
            magic: 0xDEAD_BEEF,
            ..SnapshotHeader::new(0)
        };
        assert!(matches!(bad.validate(), Err(DeserializeError::InvalidMagic(_))));

        let future = SnapshotHeader {
            version: FORMAT_VERSION + 1,
            ..SnapshotHeader::new(0)
        };
        assert!(matches!(future.validate(), Err(DeserializeError::FutureVersion(_))));
    }

    #[test]
    fn garbage_fails_to_decode() {
        let (mut state, _) = deployed("register");
        assert!(matches!(
            state.restore_storage(&[1, 2, 3]),
            Err(DeserializeError::Decode(_))
        ));
    }
}

//! Contract definitions by name, and deployment of the full set.

use crate::chef::Chef;
use crate::inventory::Inventory;
use crate::manager::Manager;
use crate::server::Server;
use crate::shrine::Shrine;
use puzzlepool_chain::{ContractAddress, ContractDefinition, ExecutionState, StateError};
use std::sync::Arc;

/// Every contract of the game, in deployment order.
pub const CONTRACT_NAMES: [&str; 5] = ["chef", "server", "inventory", "shrine", "manager"];

/// Definition of the named contract, with every scaled quantity
/// (arena, puzzle layouts, launch speed cap) multiplied by `scale`.
pub fn definition(name: &str, scale: i64) -> Option<ContractDefinition> {
    let def: ContractDefinition = match name {
        "chef" => Arc::new(Chef::with_scale(scale)),
        "server" => Arc::new(Server::with_scale(scale)),
        "inventory" => Arc::new(Inventory),
        "shrine" => Arc::new(Shrine),
        "manager" => Arc::new(Manager::with_scale(scale)),
        _ => return None,
    };
    Some(def)
}

/// Addresses of a deployed contract set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub chef: ContractAddress,
    pub server: ContractAddress,
    pub inventory: ContractAddress,
    pub shrine: ContractAddress,
    pub manager: ContractAddress,
}

impl Deployment {
    /// Deploy all five contracts at fixed-point `scale`.
    pub fn deploy(state: &mut ExecutionState, scale: i64) -> Result<Self, StateError> {
        Ok(Self {
            chef: state.deploy(&[], Arc::new(Chef::with_scale(scale)))?,
            server: state.deploy(&[], Arc::new(Server::with_scale(scale)))?,
            inventory: state.deploy(&[], Arc::new(Inventory))?,
            shrine: state.deploy(&[], Arc::new(Shrine))?,
            manager: state.deploy(&[], Arc::new(Manager::with_scale(scale)))?,
        })
    }

    /// Address of the named contract.
    pub fn address(&self, name: &str) -> Option<ContractAddress> {
        match name {
            "chef" => Some(self.chef),
            "server" => Some(self.server),
            "inventory" => Some(self.inventory),
            "shrine" => Some(self.shrine),
            "manager" => Some(self.manager),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::DEFAULT_SCALE;

    #[test]
    fn every_name_has_a_definition() {
        for name in CONTRACT_NAMES {
            let def = definition(name, DEFAULT_SCALE).unwrap();
            assert_eq!(def.name(), name);
        }
        assert!(definition("oracle", DEFAULT_SCALE).is_none());
    }

    #[test]
    fn deployment_matches_catalog_order() {
        let mut state = ExecutionState::default();
        let deployment = Deployment::deploy(&mut state, DEFAULT_SCALE).unwrap();
        for (nonce, name) in CONTRACT_NAMES.iter().enumerate() {
            let address = deployment.address(name).unwrap();
            assert_eq!(address, ContractAddress::derive(nonce as u64, name));
            assert_eq!(state.contract_name(address), Some(*name));
        }
    }

    #[test]
    fn layouts_follow_the_deployed_scale() {
        use crate::clients::ManagerClient;
        use crate::test_utils::ADMIN;

        let mut state = ExecutionState::default();
        let d = Deployment::deploy(&mut state, 100).unwrap();
        let manager = ManagerClient::new(d.manager);
        manager
            .admin_initialize_addresses(&mut state, ADMIN, d.inventory, d.server, d.chef, d.shrine)
            .unwrap();
        manager.admin_initialize_puzzle(&mut state, ADMIN).unwrap();
        let pulled = manager.client_pull_puzzle(&state).unwrap();
        assert_eq!(pulled.layout.positions[0], (300 * 100, 250 * 100));
    }
}

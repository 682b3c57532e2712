//! Manager binding shared by the shrine and the inventory.

use puzzlepool_chain::{ContractAddress, ContractError, ExecutionContext};

const MANAGER: &str = "manager";

/// Record the caller as this contract's manager. Only the first call wins.
pub(crate) fn bind_manager(ctx: &mut ExecutionContext<'_>) -> Result<(), ContractError> {
    let current = ctx.read_address(MANAGER, &[]);
    if current != ContractAddress::ZERO {
        return Err(ContractError::assertion(format!(
            "manager already bound to {current}"
        )));
    }
    let caller = ctx.caller_address();
    ctx.write_address(MANAGER, &[], caller)
}

/// Fail unless the caller is the bound manager.
pub(crate) fn require_manager(ctx: &ExecutionContext<'_>) -> Result<(), ContractError> {
    let manager = ctx.read_address(MANAGER, &[]);
    if manager == ContractAddress::ZERO || manager != ctx.caller_address() {
        return Err(ContractError::assertion(format!(
            "caller {} is not the manager",
            ctx.caller_address()
        )));
    }
    Ok(())
}

pub(crate) fn manager(ctx: &ExecutionContext<'_>) -> ContractAddress {
    ctx.read_address(MANAGER, &[])
}

//! The `inventory` contract: reward balances minted by the manager.

use crate::access;
use puzzlepool_chain::{
    CalldataReader, CalldataWriter, Contract, ContractError, EntryPoint, ExecutionContext,
};
use puzzlepool_felt::Felt;

const ENTRY_POINTS: &[EntryPoint] = &[
    EntryPoint::external("bind_manager"),
    EntryPoint::external("mint"),
    EntryPoint::view("view_balance"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Inventory;

impl Contract for Inventory {
    fn name(&self) -> &str {
        "inventory"
    }

    fn entry_points(&self) -> &[EntryPoint] {
        ENTRY_POINTS
    }

    fn execute(
        &self,
        ctx: &mut ExecutionContext<'_>,
        selector: &str,
        calldata: &[Felt],
    ) -> Result<Vec<Felt>, ContractError> {
        let field = ctx.field();
        let mut r = CalldataReader::new(field, calldata);
        match selector {
            "bind_manager" => {
                r.finish()?;
                access::bind_manager(ctx)?;
                Ok(vec![])
            }
            "mint" => {
                let player = r.next_address()?;
                let amount = r.next_u64()?;
                r.finish()?;
                access::require_manager(ctx)?;
                if amount == 0 {
                    return Ok(vec![]);
                }
                let balance = ctx
                    .read_u64("balance", &[player.felt()])?
                    .checked_add(amount)
                    .ok_or_else(|| ContractError::assertion("balance overflow"))?;
                ctx.write_u64("balance", &[player.felt()], balance)?;
                ctx.emit_event(
                    "minted",
                    vec![player.felt()],
                    CalldataWriter::new(field).u64(amount).u64(balance).finish(),
                )?;
                Ok(vec![])
            }
            "view_balance" => {
                let player = r.next_address()?;
                r.finish()?;
                let balance = ctx.read_u64("balance", &[player.felt()])?;
                Ok(CalldataWriter::new(field).u64(balance).finish())
            }
            _ => Err(ContractError::UnknownEntryPoint {
                contract: self.name().to_string(),
                selector: selector.to_string(),
            }),
        }
    }
}

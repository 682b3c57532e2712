//! The `chef` contract: one physics frame per call.

use crate::physics::{PhysicsParams, SystemState, euler_forward};
use puzzlepool_chain::{
    CalldataReader, CalldataWriter, Contract, ContractError, EntryPoint, ExecutionContext, ensure,
};
use puzzlepool_felt::Felt;

/// Steps charged for computing one frame.
pub const FRAME_COST: u64 = 20_000;

const ENTRY_POINTS: &[EntryPoint] = &[EntryPoint::view("euler_forward")];

/// Stateless physics engine.
///
/// `euler_forward(state) -> (state_nxt, touched)`
#[derive(Debug, Clone, Default)]
pub struct Chef {
    params: PhysicsParams,
}

impl Chef {
    pub fn new(params: PhysicsParams) -> Self {
        Self { params }
    }

    pub fn with_scale(scale: i64) -> Self {
        Self::new(PhysicsParams::with_scale(scale))
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }
}

impl Contract for Chef {
    fn name(&self) -> &str {
        "chef"
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
        match selector {
            "euler_forward" => {
                ctx.consume_steps(FRAME_COST)?;
                let mut r = CalldataReader::new(ctx.field(), calldata);
                let state: SystemState = r.next()?;
                r.finish()?;
                ensure(state.is_within(&self.params), "state out of bounds")?;
                let (next, touched) = euler_forward(&state, &self.params);
                Ok(CalldataWriter::new(ctx.field())
                    .with(&next)
                    .with(&touched)
                    .finish())
            }
            _ => Err(ContractError::UnknownEntryPoint {
                contract: self.name().to_string(),
                selector: selector.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BallState, TouchedMask};
    use puzzlepool_chain::{ExecutionState, WireFormat};
    use std::sync::Arc;

    #[test]
    fn euler_forward_over_calldata() {
        let mut state = ExecutionState::default();
        let chef = state.deploy(&[], Arc::new(Chef::default())).unwrap();
        let field = state.field();

        let mut system = SystemState::default();
        for (i, ball) in system.balls.iter_mut().enumerate() {
            *ball = BallState::at(600_000 * (i as i64 + 1), 2_500_000);
        }
        let system = system.with_player_velocity(-1_000_000, -2_300_000);

        let calldata = CalldataWriter::new(field).with(&system).finish();
        let ret = state.call(chef, "euler_forward", &calldata).unwrap();
        assert_eq!(ret.len(), SystemState::WIDTH + TouchedMask::WIDTH);

        let mut r = CalldataReader::new(field, &ret);
        let next: SystemState = r.next().unwrap();
        let touched: TouchedMask = r.next().unwrap();
        r.finish().unwrap();
        assert_eq!(
            (next, touched),
            euler_forward(&system, &PhysicsParams::default())
        );
        assert!(next.player().vx < 0);
    }

    #[test]
    fn extreme_state_reverts() {
        let mut state = ExecutionState::default();
        let chef = state.deploy(&[], Arc::new(Chef::default())).unwrap();
        let field = state.field();

        let mut system = SystemState::default();
        system.balls[0].x = i64::MAX;
        system.balls[1].x = -10;
        let calldata = CalldataWriter::new(field).with(&system).finish();
        let err = state.call(chef, "euler_forward", &calldata).unwrap_err();
        assert!(matches!(
            err.contract_error(),
            Some(ContractError::Assertion(msg)) if msg == "state out of bounds"
        ));

        let mut system = SystemState::default();
        system.balls[2].vy = i64::MIN;
        let calldata = CalldataWriter::new(field).with(&system).finish();
        assert!(state.call(chef, "euler_forward", &calldata).is_err());
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let mut state = ExecutionState::default();
        let chef = state.deploy(&[], Arc::new(Chef::default())).unwrap();
        let err = state.call(chef, "euler_forward", &[Felt::ONE]).unwrap_err();
        assert!(matches!(
            err.contract_error(),
            Some(ContractError::CalldataTooShort { .. })
        ));
    }
}

//! Human-readable rendering of ball states.
//!
//! Raw felts are decoded to signed values first, then divided by the
//! fixed-point scale, so `-915164` at scale 10000 prints as `-91.5164`.

use puzzlepool_contracts::{BallState, SystemState};
use puzzlepool_felt::{Felt, Field, FieldError};
use std::fmt;

/// A scaled integer shown as a decimal number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scaled {
    pub value: i64,
    pub scale: i64,
}

impl fmt::Display for Scaled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value as f64 / self.scale as f64)
    }
}

/// Render one ball as `x=…, y=…, vx=…, vy=…, ax=…, ay=…`.
pub fn format_ball_state(ball: &BallState, scale: i64) -> String {
    let s = |value| Scaled { value, scale };
    format!(
        "x={}, y={}, vx={}, vy={}, ax={}, ay={}",
        s(ball.x),
        s(ball.y),
        s(ball.vx),
        s(ball.vy),
        s(ball.ax),
        s(ball.ay)
    )
}

/// Render every ball of a system, one line each.
pub fn format_system_state(state: &SystemState, scale: i64) -> Vec<String> {
    state
        .balls
        .iter()
        .map(|ball| format_ball_state(ball, scale))
        .collect()
}

/// Decode six raw felts (`x, y, vx, vy, ax, ay`) into a ball.
pub fn decode_ball(field: &Field, felts: &[Felt; 6]) -> Result<BallState, FieldError> {
    let mut v = [0i64; 6];
    for (slot, e) in v.iter_mut().zip(felts) {
        *slot = field.decode_i64(*e)?;
    }
    Ok(BallState::from_array(v))
}

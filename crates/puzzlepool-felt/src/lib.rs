//! Puzzlepool Felt -- field elements for the contract execution environment.
//!
//! Every value exchanged with a deployed contract is a [`Felt`], an unsigned
//! integer modulo a large prime. Negative quantities travel as `P - |v|`.
//! The [`Field`] type owns the modulus and performs the only two conversions
//! the rest of the workspace needs:
//!
//! - [`Field::to_signed`] -- wire word to signed value (`e - P` if `e > P/2`).
//! - [`Field::to_unsigned`] -- signed value to wire word (`v mod P`).
//!
//! Nothing here is a global: callers pass the `Field` they were configured
//! with, typically [`Field::stark`].

pub mod felt;
pub mod u256;

pub use felt::{Felt, Field, FieldError, STARK_PRIME, SignedFelt};
pub use u256::{ParseU256Error, U256};

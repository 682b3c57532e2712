//! Field elements and their signed interpretation.
//!
//! A [`Felt`] is the raw word exchanged with the execution environment. It
//! has no sign: a logically negative value `v` travels as `P - |v|`. The
//! [`Field`] holds the modulus and converts between the wire word and a
//! [`SignedFelt`], so the modular encoding never leaks past the boundary.

use crate::u256::{ParseU256Error, U256};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// The Stark prime, `2^251 + 17 * 2^192 + 1`.
pub const STARK_PRIME: U256 = U256::from_limbs([1, 0, 0, 0x0800_0000_0000_0011]);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by field construction and narrowing conversions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("modulus {0} is not an odd number greater than 2")]
    InvalidModulus(U256),
    #[error("value {value} does not fit in {target}")]
    OutOfRange {
        value: SignedFelt,
        target: &'static str,
    },
    #[error(transparent)]
    Parse(#[from] ParseU256Error),
}

// ---------------------------------------------------------------------------
// Felt
// ---------------------------------------------------------------------------

/// A raw field word as sent to or received from the execution environment.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Felt(U256);

impl Felt {
    pub const ZERO: Felt = Felt(U256::ZERO);
    pub const ONE: Felt = Felt(U256::ONE);

    pub const fn new(value: U256) -> Self {
        Self(value)
    }

    pub const fn from_u64(v: u64) -> Self {
        Self(U256::from_u64(v))
    }

    pub const fn from_u128(v: u128) -> Self {
        Self(U256::from_u128(v))
    }

    /// The underlying unsigned integer.
    pub const fn value(&self) -> U256 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub const fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }
}

impl From<u64> for Felt {
    fn from(v: u64) -> Self {
        Self::from_u64(v)
    }
}

impl From<U256> for Felt {
    fn from(v: U256) -> Self {
        Self(v)
    }
}

impl FromStr for Felt {
    type Err = ParseU256Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Felt)
    }
}

impl fmt::Display for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Felt({})", self.0)
    }
}

impl fmt::LowerHex for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

// ---------------------------------------------------------------------------
// SignedFelt
// ---------------------------------------------------------------------------

/// A signed integer of up to 256 bits of magnitude.
///
/// Zero is always non-negative, so equality is structural.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SignedFelt {
    negative: bool,
    magnitude: U256,
}

impl SignedFelt {
    pub const ZERO: SignedFelt = SignedFelt {
        negative: false,
        magnitude: U256::ZERO,
    };

    pub fn new(negative: bool, magnitude: U256) -> Self {
        Self {
            negative: negative && !magnitude.is_zero(),
            magnitude,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn magnitude(&self) -> U256 {
        self.magnitude
    }
}

impl From<i128> for SignedFelt {
    fn from(v: i128) -> Self {
        Self::new(v < 0, U256::from_u128(v.unsigned_abs()))
    }
}

impl From<i64> for SignedFelt {
    fn from(v: i64) -> Self {
        Self::from(v as i128)
    }
}

impl TryFrom<SignedFelt> for i128 {
    type Error = FieldError;

    fn try_from(v: SignedFelt) -> Result<Self, Self::Error> {
        let out_of_range = || FieldError::OutOfRange {
            value: v,
            target: "i128",
        };
        let m = v.magnitude.to_u128().ok_or_else(out_of_range)?;
        if !v.negative {
            i128::try_from(m).map_err(|_| out_of_range())
        } else if m <= i128::MAX as u128 {
            Ok(-(m as i128))
        } else if m == i128::MAX as u128 + 1 {
            Ok(i128::MIN)
        } else {
            Err(out_of_range())
        }
    }
}

impl TryFrom<SignedFelt> for i64 {
    type Error = FieldError;

    fn try_from(v: SignedFelt) -> Result<Self, Self::Error> {
        let wide = i128::try_from(v).map_err(|_| FieldError::OutOfRange {
            value: v,
            target: "i64",
        })?;
        i64::try_from(wide).map_err(|_| FieldError::OutOfRange {
            value: v,
            target: "i64",
        })
    }
}

impl fmt::Display for SignedFelt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad_integral(!self.negative, "", &self.magnitude.to_dec_string())
    }
}

impl fmt::Debug for SignedFelt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignedFelt({self})")
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// A prime field `Z/PZ`, carried explicitly wherever felts are encoded or
/// decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "U256", into = "U256")]
pub struct Field {
    prime: U256,
    half: U256,
}

impl Field {
    /// Create a field over `prime`. Primality is not checked; the modulus
    /// must be odd and at least 3.
    pub fn new(prime: U256) -> Result<Self, FieldError> {
        if prime < U256::from_u64(3) || !prime.is_odd() {
            return Err(FieldError::InvalidModulus(prime));
        }
        Ok(Self {
            prime,
            half: prime.shr1(),
        })
    }

    /// The field used by the Stark execution environment.
    pub const fn stark() -> Self {
        Self {
            prime: STARK_PRIME,
            half: STARK_PRIME.shr1(),
        }
    }

    pub fn prime(&self) -> U256 {
        self.prime
    }

    /// `P / 2`, rounded down. Values above this decode as negative.
    pub fn half(&self) -> U256 {
        self.half
    }

    /// Whether `e` is a canonical element (`e < P`).
    pub fn contains(&self, e: Felt) -> bool {
        e.value() < self.prime
    }

    /// Reduce an arbitrary 256-bit value into `[0, P)`.
    pub fn reduce(&self, v: U256) -> Felt {
        // The modulus is non-zero by construction.
        Felt(v.checked_rem(self.prime).unwrap_or(U256::ZERO))
    }

    /// Interpret `e` as a signed value: `e - P` when `e > P / 2`, else `e`.
    ///
    /// Non-canonical input is reduced first, so the mapping is total.
    pub fn to_signed(&self, e: Felt) -> SignedFelt {
        let e = self.reduce(e.value()).value();
        if e > self.half {
            SignedFelt::new(true, self.prime.wrapping_sub(e))
        } else {
            SignedFelt::new(false, e)
        }
    }

    /// Encode a signed integer as `v mod P` in `[0, P)`.
    pub fn to_unsigned(&self, v: i128) -> Felt {
        self.encode(SignedFelt::from(v))
    }

    /// Encode a signed value of any magnitude as `v mod P`.
    pub fn encode(&self, v: SignedFelt) -> Felt {
        let m = self.reduce(v.magnitude()).value();
        if !v.is_negative() || m.is_zero() {
            Felt(m)
        } else {
            Felt(self.prime.wrapping_sub(m))
        }
    }

    /// Encode an unsigned integer, reducing it if the field is small.
    pub fn encode_u64(&self, v: u64) -> Felt {
        self.reduce(U256::from_u64(v))
    }

    /// Decode to `i128`, failing if the signed value does not fit.
    pub fn decode_i128(&self, e: Felt) -> Result<i128, FieldError> {
        i128::try_from(self.to_signed(e))
    }

    /// Decode to `i64`, failing if the signed value does not fit.
    pub fn decode_i64(&self, e: Felt) -> Result<i64, FieldError> {
        i64::try_from(self.to_signed(e))
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::stark()
    }
}

impl TryFrom<U256> for Field {
    type Error = FieldError;

    fn try_from(prime: U256) -> Result<Self, Self::Error> {
        Self::new(prime)
    }
}

impl From<Field> for U256 {
    fn from(field: Field) -> Self {
        field.prime
    }
}

// ===========================================================================
// Tests
// ===========================================================================

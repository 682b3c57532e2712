//! Fixed-width 256-bit unsigned integer.
//!
//! Stored as four little-endian `u64` limbs. Only the operations the field
//! codec needs are provided: ordering, carry-propagating add/sub, shifts,
//! remainder, and decimal/hex conversion.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced when parsing a [`U256`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseU256Error {
    #[error("cannot parse integer from empty string")]
    Empty,
    #[error("invalid digit {ch:?} at position {position}")]
    InvalidDigit { ch: char, position: usize },
    #[error("number does not fit in 256 bits")]
    Overflow,
}

// ---------------------------------------------------------------------------
// U256
// ---------------------------------------------------------------------------

/// A 256-bit unsigned integer (little-endian limbs).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct U256([u64; 4]);

impl U256 {
    pub const ZERO: U256 = U256([0; 4]);
    pub const ONE: U256 = U256([1, 0, 0, 0]);
    pub const MAX: U256 = U256([u64::MAX; 4]);

    /// Build from little-endian limbs.
    pub const fn from_limbs(limbs: [u64; 4]) -> Self {
        Self(limbs)
    }

    /// Little-endian limbs.
    pub const fn limbs(&self) -> [u64; 4] {
        self.0
    }

    pub const fn from_u64(v: u64) -> Self {
        Self([v, 0, 0, 0])
    }

    pub const fn from_u128(v: u128) -> Self {
        Self([v as u64, (v >> 64) as u64, 0, 0])
    }

    /// Narrow to `u128`, or `None` if the high limbs are set.
    pub const fn to_u128(&self) -> Option<u128> {
        if self.0[2] == 0 && self.0[3] == 0 {
            Some(((self.0[1] as u128) << 64) | self.0[0] as u128)
        } else {
            None
        }
    }

    /// Narrow to `u64`, or `None` if any high limb is set.
    pub const fn to_u64(&self) -> Option<u64> {
        if self.0[1] == 0 && self.0[2] == 0 && self.0[3] == 0 {
            Some(self.0[0])
        } else {
            None
        }
    }

    pub const fn is_zero(&self) -> bool {
        self.0[0] == 0 && self.0[1] == 0 && self.0[2] == 0 && self.0[3] == 0
    }

    pub const fn is_odd(&self) -> bool {
        self.0[0] & 1 == 1
    }

    /// Value of bit `i` (0 = least significant). Bits past 255 read as zero.
    pub const fn bit(&self, i: usize) -> bool {
        if i >= 256 {
            return false;
        }
        (self.0[i / 64] >> (i % 64)) & 1 == 1
    }

    /// Logical shift right by one bit.
    pub const fn shr1(self) -> Self {
        let l = self.0;
        Self([
            (l[0] >> 1) | (l[1] << 63),
            (l[1] >> 1) | (l[2] << 63),
            (l[2] >> 1) | (l[3] << 63),
            l[3] >> 1,
        ])
    }

    /// Shift left by one bit, returning the bit shifted out of the top.
    const fn shl1_carry(self) -> (Self, bool) {
        let l = self.0;
        let out = l[3] >> 63 == 1;
        (
            Self([
                l[0] << 1,
                (l[1] << 1) | (l[0] >> 63),
                (l[2] << 1) | (l[1] >> 63),
                (l[3] << 1) | (l[2] >> 63),
            ]),
            out,
        )
    }

    /// Add with carry-out.
    pub const fn overflowing_add(self, rhs: Self) -> (Self, bool) {
        let mut out = [0u64; 4];
        let mut carry = 0u128;
        let mut i = 0;
        while i < 4 {
            let sum = self.0[i] as u128 + rhs.0[i] as u128 + carry;
            out[i] = sum as u64;
            carry = sum >> 64;
            i += 1;
        }
        (Self(out), carry != 0)
    }

    /// Subtract with borrow-out.
    pub const fn overflowing_sub(self, rhs: Self) -> (Self, bool) {
        let mut out = [0u64; 4];
        let mut borrow = false;
        let mut i = 0;
        while i < 4 {
            let (d1, b1) = self.0[i].overflowing_sub(rhs.0[i]);
            let (d2, b2) = d1.overflowing_sub(borrow as u64);
            out[i] = d2;
            borrow = b1 || b2;
            i += 1;
        }
        (Self(out), borrow)
    }

    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.overflowing_add(rhs) {
            (v, false) => Some(v),
            (_, true) => None,
        }
    }

    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.overflowing_sub(rhs) {
            (v, false) => Some(v),
            (_, true) => None,
        }
    }

    pub const fn wrapping_sub(self, rhs: Self) -> Self {
        self.overflowing_sub(rhs).0
    }

    /// Multiply by a small factor, `None` on overflow.
    pub fn checked_mul_u64(self, factor: u64) -> Option<Self> {
        let mut out = [0u64; 4];
        let mut carry = 0u128;
        for (slot, &limb) in out.iter_mut().zip(self.0.iter()) {
            let prod = limb as u128 * factor as u128 + carry;
            *slot = prod as u64;
            carry = prod >> 64;
        }
        if carry == 0 { Some(Self(out)) } else { None }
    }

    /// Divide by a small non-zero divisor, returning `(quotient, remainder)`.
    pub fn div_rem_u64(self, divisor: u64) -> Option<(Self, u64)> {
        if divisor == 0 {
            return None;
        }
        let mut out = [0u64; 4];
        let mut rem = 0u128;
        for i in (0..4).rev() {
            let cur = (rem << 64) | self.0[i] as u128;
            out[i] = (cur / divisor as u128) as u64;
            rem = cur % divisor as u128;
        }
        Some((Self(out), rem as u64))
    }

    /// Remainder modulo `modulus` by binary long division. `None` if the
    /// modulus is zero.
    pub fn checked_rem(self, modulus: Self) -> Option<Self> {
        if modulus.is_zero() {
            return None;
        }
        if self < modulus {
            return Some(self);
        }
        // Fast path: both fit in u128.
        if let (Some(a), Some(m)) = (self.to_u128(), modulus.to_u128()) {
            return Some(Self::from_u128(a % m));
        }
        let mut rem = Self::ZERO;
        for i in (0..256).rev() {
            let (shifted, carried) = rem.shl1_carry();
            rem = shifted;
            if self.bit(i) {
                rem.0[0] |= 1;
            }
            // With a carried-out bit the true value exceeds 2^256 > modulus.
            if carried || rem >= modulus {
                rem = rem.wrapping_sub(modulus);
            }
        }
        Some(rem)
    }

    /// Parse a base-10 string.
    pub fn from_dec_str(s: &str) -> Result<Self, ParseU256Error> {
        if s.is_empty() {
            return Err(ParseU256Error::Empty);
        }
        let mut acc = Self::ZERO;
        for (position, ch) in s.chars().enumerate() {
            let digit = ch
                .to_digit(10)
                .ok_or(ParseU256Error::InvalidDigit { ch, position })?;
            acc = acc
                .checked_mul_u64(10)
                .and_then(|v| v.checked_add(Self::from_u64(digit as u64)))
                .ok_or(ParseU256Error::Overflow)?;
        }
        Ok(acc)
    }

    /// Parse a base-16 string, with or without a `0x` prefix.
    pub fn from_hex_str(s: &str) -> Result<Self, ParseU256Error> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() {
            return Err(ParseU256Error::Empty);
        }
        let offset = s.len() - digits.len();
        let mut acc = Self::ZERO;
        for (i, ch) in digits.chars().enumerate() {
            let digit = ch.to_digit(16).ok_or(ParseU256Error::InvalidDigit {
                ch,
                position: offset + i,
            })?;
            acc = acc
                .checked_mul_u64(16)
                .and_then(|v| v.checked_add(Self::from_u64(digit as u64)))
                .ok_or(ParseU256Error::Overflow)?;
        }
        Ok(acc)
    }

    /// Canonical decimal representation.
    pub fn to_dec_string(&self) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        let mut digits = Vec::with_capacity(78);
        let mut value = *self;
        while !value.is_zero() {
            // Divisor is a non-zero constant.
            let Some((q, r)) = value.div_rem_u64(10) else {
                break;
            };
            digits.push(b'0' + r as u8);
            value = q;
        }
        digits.iter().rev().map(|&d| d as char).collect()
    }

    /// Little-endian byte encoding.
    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (chunk, limb) in out.chunks_exact_mut(8).zip(self.0.iter()) {
            chunk.copy_from_slice(&limb.to_le_bytes());
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in (0..4).rev() {
            match self.0[i].cmp(&other.0[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<u64> for U256 {
    fn from(v: u64) -> Self {
        Self::from_u64(v)
    }
}

impl From<u128> for U256 {
    fn from(v: u128) -> Self {
        Self::from_u128(v)
    }
}

impl FromStr for U256 {
    type Err = ParseU256Error;

    /// Decimal by default; `0x`-prefixed strings are read as hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex_str(s)
        } else {
            Self::from_dec_str(s)
        }
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad_integral(true, "", &self.to_dec_string())
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U256({})", self.to_dec_string())
    }
}

impl fmt::LowerHex for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::new();
        let mut leading = true;
        for limb in self.0.iter().rev() {
            if leading {
                if *limb != 0 {
                    s.push_str(&format!("{limb:x}"));
                    leading = false;
                }
            } else {
                s.push_str(&format!("{limb:016x}"));
            }
        }
        if leading {
            s.push('0');
        }
        f.pad_integral(true, "0x", &s)
    }
}

impl serde::Serialize for U256 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for U256 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_round_trip() {
        let s = "3618502788666131213697322783095070105623107215331596699973092056135872020481";
        let v = U256::from_dec_str(s).unwrap();
        assert_eq!(v.to_dec_string(), s);
        assert_eq!(v.limbs(), [1, 0, 0, 0x0800_0000_0000_0011]);
    }

    #[test]
    fn zero_formats_as_zero() {
        assert_eq!(U256::ZERO.to_string(), "0");
        assert_eq!(format!("{:x}", U256::ZERO), "0");
    }

    #[test]
    fn hex_parsing_and_formatting() {
        let v =
            U256::from_hex_str("0x800000000000011000000000000000000000000000000000000000000000001")
                .unwrap();
        assert_eq!(v.limbs(), [1, 0, 0, 0x0800_0000_0000_0011]);
        assert_eq!(
            format!("{v:#x}"),
            "0x800000000000011000000000000000000000000000000000000000000000001"
        );
        assert_eq!("0x3039".parse::<U256>().unwrap(), U256::from_u64(12345));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(U256::from_dec_str(""), Err(ParseU256Error::Empty));
        assert_eq!(
            U256::from_dec_str("12a"),
            Err(ParseU256Error::InvalidDigit {
                ch: 'a',
                position: 2
            })
        );
        assert_eq!(U256::from_hex_str("0x"), Err(ParseU256Error::Empty));
        let too_big = format!("{}0", U256::MAX);
        assert_eq!(U256::from_dec_str(&too_big), Err(ParseU256Error::Overflow));
    }

    #[test]
    fn max_is_two_pow_256_minus_one() {
        assert_eq!(
            U256::MAX.to_string(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
    }

    #[test]
    fn add_and_sub_carry_across_limbs() {
        let a = U256::from_limbs([u64::MAX, u64::MAX, 0, 0]);
        let sum = a.checked_add(U256::ONE).unwrap();
        assert_eq!(sum.limbs(), [0, 0, 1, 0]);
        assert_eq!(sum.checked_sub(U256::ONE).unwrap(), a);
        assert!(U256::MAX.checked_add(U256::ONE).is_none());
        assert!(U256::ZERO.checked_sub(U256::ONE).is_none());
        assert_eq!(U256::ZERO.wrapping_sub(U256::ONE), U256::MAX);
    }

    #[test]
    fn ordering_uses_high_limbs_first() {
        let low = U256::from_limbs([u64::MAX, 0, 0, 0]);
        let high = U256::from_limbs([0, 0, 0, 1]);
        assert!(low < high);
        assert!(U256::MAX > high);
    }

    #[test]
    fn shr1_halves() {
        let v = U256::from_limbs([0, 1, 0, 0]);
        assert_eq!(v.shr1().limbs(), [1 << 63, 0, 0, 0]);
        assert_eq!(U256::from_u64(7).shr1(), U256::from_u64(3));
    }

    #[test]
    fn remainder_small_and_large() {
        assert_eq!(
            U256::from_u64(100).checked_rem(U256::from_u64(7)),
            Some(U256::from_u64(2))
        );
        assert_eq!(U256::from_u64(5).checked_rem(U256::ZERO), None);

        // (2^256 - 1) mod (2^255 + 1) = 2^255 - 2
        let m = U256::from_limbs([1, 0, 0, 1 << 63]);
        let expected = U256::from_limbs([u64::MAX - 1, u64::MAX, u64::MAX, (1 << 63) - 1]);
        assert_eq!(U256::MAX.checked_rem(m), Some(expected));
    }

    #[test]
    fn narrowing() {
        assert_eq!(U256::from_u128(u128::MAX).to_u128(), Some(u128::MAX));
        assert_eq!(U256::from_limbs([0, 0, 1, 0]).to_u128(), None);
        assert_eq!(U256::from_u64(9).to_u64(), Some(9));
        assert_eq!(U256::from_u128(1 << 64).to_u64(), None);
    }

    #[test]
    fn serde_uses_decimal_strings() {
        let v = U256::from_u64(12345);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"12345\"");
        let back: U256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}

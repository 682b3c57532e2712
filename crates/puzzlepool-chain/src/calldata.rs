//! Calldata encoding and decoding.
//!
//! Contracts never see raw modular arithmetic: a [`CalldataReader`] decodes
//! each felt into a signed or unsigned integer through the configured
//! [`Field`], and a [`CalldataWriter`] encodes return values the same way.

use crate::contract::ContractError;
use crate::id::ContractAddress;
use puzzlepool_felt::{Felt, Field, FieldError};

// ---------------------------------------------------------------------------
// Wire format trait
// ---------------------------------------------------------------------------

/// A type with a fixed calldata layout.
pub trait WireFormat: Sized {
    /// Number of felts the encoding occupies.
    const WIDTH: usize;

    fn write(&self, w: &mut CalldataWriter);

    fn read(r: &mut CalldataReader<'_>) -> Result<Self, ContractError>;
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Sequential decoder over a calldata or retdata slice.
#[derive(Debug)]
pub struct CalldataReader<'a> {
    field: Field,
    data: &'a [Felt],
    pos: usize,
}

impl<'a> CalldataReader<'a> {
    pub fn new(field: Field, data: &'a [Felt]) -> Self {
        Self { field, data, pos: 0 }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// Felts not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn next_felt(&mut self) -> Result<Felt, ContractError> {
        let value = self
            .data
            .get(self.pos)
            .copied()
            .ok_or(ContractError::CalldataTooShort {
                needed: self.pos + 1,
                got: self.data.len(),
            })?;
        self.pos += 1;
        Ok(value)
    }

    /// Decode a signed value (`e > P/2` is negative).
    pub fn next_i64(&mut self) -> Result<i64, ContractError> {
        let e = self.next_felt()?;
        Ok(self.field.decode_i64(e)?)
    }

    /// Decode an unsigned value that must fit in `u64`.
    pub fn next_u64(&mut self) -> Result<u64, ContractError> {
        let e = self.next_felt()?;
        let reduced = self.field.reduce(e.value());
        reduced.to_u64().ok_or_else(|| {
            ContractError::Field(FieldError::OutOfRange {
                value: self.field.to_signed(e),
                target: "u64",
            })
        })
    }

    /// Decode a boolean, which must be exactly 0 or 1.
    pub fn next_bool(&mut self) -> Result<bool, ContractError> {
        match self.next_u64()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ContractError::assertion(format!(
                "expected boolean, got {other}"
            ))),
        }
    }

    pub fn next_address(&mut self) -> Result<ContractAddress, ContractError> {
        self.next_felt().map(ContractAddress)
    }

    pub fn next<T: WireFormat>(&mut self) -> Result<T, ContractError> {
        T::read(self)
    }

    /// Fail if any felts are left over.
    pub fn finish(self) -> Result<(), ContractError> {
        if self.pos == self.data.len() {
            Ok(())
        } else {
            Err(ContractError::TrailingCalldata {
                consumed: self.pos,
                got: self.data.len(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Sequential encoder producing calldata or retdata.
#[derive(Debug, Clone)]
pub struct CalldataWriter {
    field: Field,
    data: Vec<Felt>,
}

impl CalldataWriter {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            data: Vec::new(),
        }
    }

    pub fn felt(mut self, v: Felt) -> Self {
        self.push_felt(v);
        self
    }

    pub fn i64(mut self, v: i64) -> Self {
        self.push_i64(v);
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.push_u64(v);
        self
    }

    pub fn bool(mut self, v: bool) -> Self {
        self.push_bool(v);
        self
    }

    pub fn address(mut self, v: ContractAddress) -> Self {
        self.push_address(v);
        self
    }

    pub fn with<T: WireFormat>(mut self, v: &T) -> Self {
        v.write(&mut self);
        self
    }

    pub fn push_felt(&mut self, v: Felt) {
        self.data.push(v);
    }

    pub fn push_i64(&mut self, v: i64) {
        self.data.push(self.field.to_unsigned(v as i128));
    }

    pub fn push_u64(&mut self, v: u64) {
        self.data.push(self.field.encode_u64(v));
    }

    pub fn push_bool(&mut self, v: bool) {
        self.data.push(if v { Felt::ONE } else { Felt::ZERO });
    }

    pub fn push_address(&mut self, v: ContractAddress) {
        self.data.push(v.felt());
    }

    pub fn push<T: WireFormat>(&mut self, v: &T) {
        v.write(self);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn finish(self) -> Vec<Felt> {
        self.data
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl WireFormat for Point {
        const WIDTH: usize = 2;

        fn write(&self, w: &mut CalldataWriter) {
            w.push_i64(self.x);
            w.push_i64(self.y);
        }

        fn read(r: &mut CalldataReader<'_>) -> Result<Self, ContractError> {
            Ok(Self {
                x: r.next_i64()?,
                y: r.next_i64()?,
            })
        }
    }

    #[test]
    fn negative_values_travel_as_upper_half() {
        let field = Field::stark();
        let data = CalldataWriter::new(field).i64(-1_000_000).finish();
        assert!(data[0].value() > field.half());

        let mut r = CalldataReader::new(field, &data);
        assert_eq!(r.next_i64().unwrap(), -1_000_000);
        r.finish().unwrap();
    }

    #[test]
    fn struct_layout_round_trips() {
        let field = Field::stark();
        let p = Point { x: -3, y: 7 };
        let data = CalldataWriter::new(field).with(&p).bool(true).finish();
        assert_eq!(data.len(), Point::WIDTH + 1);

        let mut r = CalldataReader::new(field, &data);
        assert_eq!(r.next::<Point>().unwrap(), p);
        assert!(r.next_bool().unwrap());
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn short_calldata_is_an_error() {
        let field = Field::stark();
        let data = vec![Felt::from_u64(1)];
        let mut r = CalldataReader::new(field, &data);
        r.next_u64().unwrap();
        assert!(matches!(
            r.next_u64(),
            Err(ContractError::CalldataTooShort { needed: 2, got: 1 })
        ));
    }

    #[test]
    fn trailing_calldata_is_an_error() {
        let field = Field::stark();
        let data = vec![Felt::from_u64(1), Felt::from_u64(2)];
        let mut r = CalldataReader::new(field, &data);
        r.next_u64().unwrap();
        assert!(matches!(
            r.finish(),
            Err(ContractError::TrailingCalldata { consumed: 1, got: 2 })
        ));
    }

    #[test]
    fn booleans_must_be_zero_or_one() {
        let field = Field::stark();
        let data = vec![Felt::from_u64(2)];
        let mut r = CalldataReader::new(field, &data);
        assert!(matches!(r.next_bool(), Err(ContractError::Assertion(_))));
    }

    #[test]
    fn negative_value_is_not_a_u64() {
        let field = Field::stark();
        let data = CalldataWriter::new(field).i64(-5).finish();
        let mut r = CalldataReader::new(field, &data);
        assert!(matches!(
            r.next_u64(),
            Err(ContractError::Field(FieldError::OutOfRange { target: "u64", .. }))
        ));
    }
}

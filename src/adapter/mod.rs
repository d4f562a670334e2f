//! Dynamic-value views over typed fields
//!
//! Generic tooling (inspectors, editors, test harnesses) cannot name every
//! concrete field type. An adapter borrows one field mutably for the length
//! of a single inspection or edit and exposes it through [`FieldAdapter`].
//! The borrow guarantees an adapter never outlives its field and that two
//! adapters never race on the same field.

mod bits;
mod numeric;
mod unknown;

use bytes::BytesMut;

use crate::field::Field;

pub use bits::{BitfieldAdapter, BitmaskAdapter};
pub use numeric::NumericAdapter;
pub use unknown::UnknownValueAdapter;

/// Width of the numeric representation used by adapters, in bits.
pub const ADAPTER_WIDTH: usize = 64;

/// Adapter category, fixed by the field's category at definition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// Integer fields
    Numeric,
    /// Bitmask fields
    Bitmask,
    /// Bitfield fields
    Bitfield,
    /// Anything without a numeric view
    UnknownValue,
}

/// Uniform get/set interface over a single field.
pub trait FieldAdapter {
    /// Adapter category.
    fn kind(&self) -> AdapterKind;

    /// Numeric value, or `None` for fields without a numeric view.
    fn value(&self) -> Option<u64>;

    /// Replace the numeric value. Returns `false` if the field has no
    /// numeric view. Does not refresh the field.
    fn set_value(&mut self, value: u64) -> bool;

    /// Exactly the bytes the field's `write` produces right now.
    fn serialised_value(&self) -> Vec<u8>;

    /// Decode `bytes` through the field's own `read`.
    ///
    /// Returns `false` and leaves the field untouched when `bytes` is empty
    /// or decoding fails.
    fn set_serialised_value(&mut self, bytes: &[u8]) -> bool;

    /// Field validity.
    fn valid(&self) -> bool;

    /// Serialized length in bytes.
    fn length(&self) -> usize;

    /// Serialized length in bits.
    fn bit_length(&self) -> usize {
        self.length() * 8
    }

    /// Refresh the underlying field.
    fn refresh(&mut self) -> bool;
}

pub(crate) fn serialise<F: Field>(field: &F) -> Vec<u8> {
    let len = field.length();
    let mut out = BytesMut::with_capacity(len);
    match field.write(&mut out, len) {
        Ok(()) => out.to_vec(),
        Err(_) => Vec::new(),
    }
}

pub(crate) fn deserialise<F: Field + Clone>(field: &mut F, bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let mut scratch = field.clone();
    let mut input = bytes;
    if scratch.read(&mut input).is_err() {
        return false;
    }
    *field = scratch;
    true
}

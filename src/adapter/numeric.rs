//! Numeric adapter for integer fields

use super::{ADAPTER_WIDTH, AdapterKind, FieldAdapter, deserialise, serialise};
use crate::field::{Field, IntField, int::normalize};
use crate::protocol::DefinitionError;

/// Numeric view over an [`IntField`].
///
/// Values are exchanged as `u64`; signed fields use two's complement within
/// the adapter width.
#[derive(Debug)]
pub struct NumericAdapter<'a> {
    field: &'a mut IntField,
    width: usize,
}

impl<'a> NumericAdapter<'a> {
    /// Adapter with the default 64-bit representation.
    pub fn new(field: &'a mut IntField) -> Result<Self, DefinitionError> {
        Self::with_width(field, ADAPTER_WIDTH)
    }

    /// Adapter with a representation of `width` bits (at most 64).
    ///
    /// Fails if the field serializes more bits than the representation holds.
    pub fn with_width(field: &'a mut IntField, width: usize) -> Result<Self, DefinitionError> {
        let width = width.min(ADAPTER_WIDTH);
        let bits = field.bit_length();
        if bits > width {
            return Err(DefinitionError::AdapterTooNarrow { bits, max: width });
        }
        Ok(Self { field, width })
    }

    pub(crate) fn from_checked(field: &'a mut IntField, width: usize) -> Self {
        debug_assert!(field.bit_length() <= width);
        Self { field, width }
    }

    /// Representation width in bits.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }
}

impl FieldAdapter for NumericAdapter<'_> {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Numeric
    }

    fn value(&self) -> Option<u64> {
        Some(normalize(self.field.value(), self.width, false) as u64)
    }

    fn set_value(&mut self, value: u64) -> bool {
        let signed = self.field.int_type().is_signed();
        self.field
            .set_value(normalize(i128::from(value), self.width, signed));
        true
    }

    fn serialised_value(&self) -> Vec<u8> {
        serialise(&*self.field)
    }

    fn set_serialised_value(&mut self, bytes: &[u8]) -> bool {
        deserialise(&mut *self.field, bytes)
    }

    fn valid(&self) -> bool {
        self.field.valid()
    }

    fn length(&self) -> usize {
        self.field.length()
    }

    fn refresh(&mut self) -> bool {
        self.field.refresh()
    }
}

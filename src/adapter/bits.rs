//! Adapters for bit-packed fields

use super::{AdapterKind, FieldAdapter, deserialise, serialise};
use crate::field::{BitfieldField, BitmaskField, Field};

/// View over a [`BitmaskField`].
#[derive(Debug)]
pub struct BitmaskAdapter<'a> {
    field: &'a mut BitmaskField,
}

impl<'a> BitmaskAdapter<'a> {
    /// Bitmasks are at most 64 bits wide, so construction cannot fail.
    pub fn new(field: &'a mut BitmaskField) -> Self {
        Self { field }
    }

    /// Single bit, honoring the field's bit origin.
    #[must_use]
    pub fn bit(&self, idx: usize) -> bool {
        self.field.bit(idx)
    }

    /// Set a single bit.
    pub fn set_bit(&mut self, idx: usize, value: bool) -> bool {
        self.field.set_bit(idx, value)
    }
}

impl FieldAdapter for BitmaskAdapter<'_> {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Bitmask
    }

    fn value(&self) -> Option<u64> {
        Some(self.field.value())
    }

    fn set_value(&mut self, value: u64) -> bool {
        self.field.set_value(value);
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

/// View over a [`BitfieldField`]; the numeric value is the packed form.
#[derive(Debug)]
pub struct BitfieldAdapter<'a> {
    field: &'a mut BitfieldField,
}

impl<'a> BitfieldAdapter<'a> {
    /// Bitfields are at most 64 bits wide, so construction cannot fail.
    pub fn new(field: &'a mut BitfieldField) -> Self {
        Self { field }
    }

    /// Number of members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.field.member_count()
    }

    /// Member value.
    #[must_use]
    pub fn member(&self, idx: usize) -> Option<u64> {
        self.field.member(idx)
    }

    /// Replace a member value.
    pub fn set_member(&mut self, idx: usize, value: u64) -> bool {
        self.field.set_member(idx, value)
    }
}

impl FieldAdapter for BitfieldAdapter<'_> {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Bitfield
    }

    fn value(&self) -> Option<u64> {
        Some(self.field.value())
    }

    fn set_value(&mut self, value: u64) -> bool {
        self.field.set_value(value);
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

//! Typed message fields
//!
//! A field is the smallest independently encodable unit of a message. Its
//! behavior is fixed when it is defined, from a [`FieldOptions`] record;
//! nothing about the wire layout can be toggled afterwards.

mod bitfield;
mod bitmask;
mod blob;
pub(crate) mod int;
mod options;

use std::fmt;

use bytes::BytesMut;

use crate::adapter::{
    ADAPTER_WIDTH, BitfieldAdapter, BitmaskAdapter, FieldAdapter, NumericAdapter,
    UnknownValueAdapter,
};
use crate::protocol::Result;

pub use bitfield::BitfieldField;
pub use bitmask::{BITMASK_DEFAULT_LEN, BitmaskField};
pub use blob::BlobField;
pub use int::{IntField, IntType};
pub use options::{BitOrigin, Endian, FieldOption, FieldOptions, LengthPolicy, Validator};

/// Semantic category of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Signed or unsigned integer
    Int,
    /// Independent flag bits
    Bitmask,
    /// Packed multi-member bitfield
    Bitfield,
    /// Opaque bytes
    Blob,
}

impl FieldKind {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Bitmask => "bitmask",
            Self::Bitfield => "bitfield",
            Self::Blob => "blob",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire behavior shared by every field kind.
pub trait Field: fmt::Debug {
    /// Semantic category.
    fn kind(&self) -> FieldKind;

    /// Serialized length of the current value.
    fn length(&self) -> usize;

    /// Serialized length in bits.
    fn bit_length(&self) -> usize {
        self.length() * 8
    }

    /// Decode from the front of `input`, advancing it past the consumed
    /// bytes. On error neither the value nor `input` changes.
    fn read(&mut self, input: &mut &[u8]) -> Result<()>;

    /// Append exactly [`Field::length`] bytes to `out`.
    fn write(&self, out: &mut BytesMut, max_len: usize) -> Result<()>;

    /// Whether the current value is in range and accepted by the validator.
    fn valid(&self) -> bool;

    /// Normalize derived state; `true` if anything changed.
    fn refresh(&mut self) -> bool {
        false
    }

    /// What [`Field::refresh`] would report, without mutating.
    fn pending_refresh(&self) -> bool {
        false
    }
}

/// Any field, as stored in a message.
#[derive(Debug, Clone)]
pub enum AnyField {
    /// Integer field
    Int(IntField),
    /// Bitmask field
    Bitmask(BitmaskField),
    /// Bitfield field
    Bitfield(BitfieldField),
    /// Blob field
    Blob(BlobField),
}

macro_rules! delegate {
    ($self:ident, $field:ident => $body:expr) => {
        match $self {
            AnyField::Int($field) => $body,
            AnyField::Bitmask($field) => $body,
            AnyField::Bitfield($field) => $body,
            AnyField::Blob($field) => $body,
        }
    };
}

impl AnyField {
    /// Integer view.
    #[must_use]
    pub fn as_int(&self) -> Option<&IntField> {
        match self {
            Self::Int(f) => Some(f),
            _ => None,
        }
    }

    /// Mutable integer view.
    pub fn as_int_mut(&mut self) -> Option<&mut IntField> {
        match self {
            Self::Int(f) => Some(f),
            _ => None,
        }
    }

    /// Bitmask view.
    #[must_use]
    pub fn as_bitmask(&self) -> Option<&BitmaskField> {
        match self {
            Self::Bitmask(f) => Some(f),
            _ => None,
        }
    }

    /// Mutable bitmask view.
    pub fn as_bitmask_mut(&mut self) -> Option<&mut BitmaskField> {
        match self {
            Self::Bitmask(f) => Some(f),
            _ => None,
        }
    }

    /// Bitfield view.
    #[must_use]
    pub fn as_bitfield(&self) -> Option<&BitfieldField> {
        match self {
            Self::Bitfield(f) => Some(f),
            _ => None,
        }
    }

    /// Mutable bitfield view.
    pub fn as_bitfield_mut(&mut self) -> Option<&mut BitfieldField> {
        match self {
            Self::Bitfield(f) => Some(f),
            _ => None,
        }
    }

    /// Blob view.
    #[must_use]
    pub fn as_blob(&self) -> Option<&BlobField> {
        match self {
            Self::Blob(f) => Some(f),
            _ => None,
        }
    }

    /// Mutable blob view.
    pub fn as_blob_mut(&mut self) -> Option<&mut BlobField> {
        match self {
            Self::Blob(f) => Some(f),
            _ => None,
        }
    }

    /// Dynamic view matching this field's category.
    ///
    /// Integers wider than 64 bits have no numeric representation and get
    /// the byte-only [`UnknownValueAdapter`].
    pub fn adapter(&mut self) -> Box<dyn FieldAdapter + '_> {
        match self {
            Self::Int(f) => {
                if f.bit_length() <= ADAPTER_WIDTH {
                    Box::new(NumericAdapter::from_checked(f, ADAPTER_WIDTH))
                } else {
                    Box::new(UnknownValueAdapter::new(f))
                }
            }
            Self::Bitmask(f) => Box::new(BitmaskAdapter::new(f)),
            Self::Bitfield(f) => Box::new(BitfieldAdapter::new(f)),
            Self::Blob(f) => Box::new(UnknownValueAdapter::new(f)),
        }
    }
}

impl Field for AnyField {
    fn kind(&self) -> FieldKind {
        delegate!(self, f => f.kind())
    }

    fn length(&self) -> usize {
        delegate!(self, f => f.length())
    }

    fn read(&mut self, input: &mut &[u8]) -> Result<()> {
        delegate!(self, f => f.read(input))
    }

    fn write(&self, out: &mut BytesMut, max_len: usize) -> Result<()> {
        delegate!(self, f => f.write(out, max_len))
    }

    fn valid(&self) -> bool {
        delegate!(self, f => f.valid())
    }

    fn refresh(&mut self) -> bool {
        delegate!(self, f => f.refresh())
    }

    fn pending_refresh(&self) -> bool {
        delegate!(self, f => f.pending_refresh())
    }
}

impl From<IntField> for AnyField {
    fn from(field: IntField) -> Self {
        Self::Int(field)
    }
}

impl From<BitmaskField> for AnyField {
    fn from(field: BitmaskField) -> Self {
        Self::Bitmask(field)
    }
}

impl From<BitfieldField> for AnyField {
    fn from(field: BitfieldField) -> Self {
        Self::Bitfield(field)
    }
}

impl From<BlobField> for AnyField {
    fn from(field: BlobField) -> Self {
        Self::Blob(field)
    }
}

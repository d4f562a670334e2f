//! Integer fields

use bytes::{BufMut, BytesMut};

use super::{Endian, Field, FieldKind, FieldOptions, Validator};
use crate::protocol::{DefinitionError, Error, Result};

/// Natural integer type of an [`IntField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntType {
    /// 8-bit unsigned
    U8,
    /// 16-bit unsigned
    U16,
    /// 32-bit unsigned
    U32,
    /// 64-bit unsigned
    U64,
    /// 128-bit unsigned
    U128,
    /// 8-bit signed
    I8,
    /// 16-bit signed
    I16,
    /// 32-bit signed
    I32,
    /// 64-bit signed
    I64,
    /// 128-bit signed
    I128,
}

impl IntType {
    /// Natural width in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 => 4,
            Self::U64 | Self::I64 => 8,
            Self::U128 | Self::I128 => 16,
        }
    }

    /// Whether values are two's complement signed.
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::I128
        )
    }

    /// Smallest unsigned type holding `bytes` bytes.
    #[must_use]
    pub const fn unsigned_for(bytes: usize) -> Self {
        match bytes {
            0 | 1 => Self::U8,
            2 => Self::U16,
            3 | 4 => Self::U32,
            5..=8 => Self::U64,
            _ => Self::U128,
        }
    }
}

/// Truncate `raw` to `bits` bits, then zero or sign extend back to 128 bits.
pub(crate) const fn normalize(raw: i128, bits: usize, signed: bool) -> i128 {
    if bits >= 128 {
        return raw;
    }
    let shift = (128 - bits) as u32;
    if signed {
        (raw << shift) >> shift
    } else {
        ((raw as u128) << shift >> shift) as i128
    }
}

/// Append the low `len` bytes of `raw`.
pub(crate) fn put_int(out: &mut BytesMut, raw: i128, len: usize, endian: Endian) {
    let le = raw.to_le_bytes();
    match endian {
        Endian::Little => out.put_slice(&le[..len]),
        Endian::Big => {
            for byte in le[..len].iter().rev() {
                out.put_u8(*byte);
            }
        }
    }
}

/// Decode `src` (at most 16 bytes) as an integer.
pub(crate) fn get_int(src: &[u8], endian: Endian, signed: bool) -> i128 {
    let mut le = [0u8; 16];
    let len = src.len().min(16);
    match endian {
        Endian::Little => le[..len].copy_from_slice(&src[..len]),
        Endian::Big => {
            for (dst, byte) in le.iter_mut().zip(src[..len].iter().rev()) {
                *dst = *byte;
            }
        }
    }
    normalize(i128::from_le_bytes(le), len * 8, signed)
}

/// Integer value serialized in a fixed number of bytes.
///
/// The value is held as `i128`; unsigned 128-bit values use the same bits
/// (see [`IntField::unsigned_value`]). `FixedLength(n)` narrows the wire
/// representation below the natural width, e.g. a `U32` carried in 3 bytes.
#[derive(Debug, Clone)]
pub struct IntField {
    ty: IntType,
    len: usize,
    endian: Endian,
    value: i128,
    validator: Option<Validator<i128>>,
}

impl IntField {
    /// Build a field from resolved options.
    pub fn new(ty: IntType, options: FieldOptions<i128>) -> std::result::Result<Self, DefinitionError> {
        options.check()?;
        let len = options.fixed_len().unwrap_or(ty.bytes());
        if len == 0 || len > ty.bytes() {
            return Err(DefinitionError::InvalidLength {
                len,
                min: 1,
                max: ty.bytes(),
            });
        }
        let endian = options.byte_order();
        let (default_value, validator) = options.into_parts();
        let value = default_value.unwrap_or(0);
        if normalize(value, len * 8, ty.is_signed()) != value {
            return Err(DefinitionError::DefaultOutOfRange { bits: len * 8 });
        }

        Ok(Self {
            ty,
            len,
            endian,
            value,
            validator,
        })
    }

    /// Baseline field of the natural width.
    #[must_use]
    pub fn of(ty: IntType) -> Self {
        Self {
            ty,
            len: ty.bytes(),
            endian: Endian::Big,
            value: 0,
            validator: None,
        }
    }

    /// Natural type.
    #[must_use]
    pub const fn int_type(&self) -> IntType {
        self.ty
    }

    /// Byte order.
    #[must_use]
    pub const fn endian(&self) -> Endian {
        self.endian
    }

    /// Current value.
    #[must_use]
    pub const fn value(&self) -> i128 {
        self.value
    }

    /// Replace the value. No range check until [`Field::refresh`] or
    /// [`Field::valid`].
    pub fn set_value(&mut self, value: i128) {
        self.value = value;
    }

    /// Current value as raw unsigned bits.
    #[must_use]
    pub const fn unsigned_value(&self) -> u128 {
        self.value as u128
    }

    /// Replace the value from raw unsigned bits.
    pub fn set_unsigned_value(&mut self, value: u128) {
        self.value = value as i128;
    }

    fn normalized(&self) -> i128 {
        normalize(self.value, self.len * 8, self.ty.is_signed())
    }

    fn accepts(&self, value: i128) -> bool {
        self.validator.as_ref().is_none_or(|v| v.check(&value))
    }
}

impl Field for IntField {
    fn kind(&self) -> FieldKind {
        FieldKind::Int
    }

    fn length(&self) -> usize {
        self.len
    }

    fn read(&mut self, input: &mut &[u8]) -> Result<()> {
        if input.len() < self.len {
            return Err(Error::not_enough_data(self.len, input.len()));
        }
        let (head, rest) = input.split_at(self.len);
        let value = get_int(head, self.endian, self.ty.is_signed());
        if !self.accepts(value) {
            return Err(Error::invalid(format!("integer value {value} rejected")));
        }
        self.value = value;
        *input = rest;
        Ok(())
    }

    fn write(&self, out: &mut BytesMut, max_len: usize) -> Result<()> {
        if max_len < self.len {
            return Err(Error::buffer_overflow(self.len, max_len));
        }
        put_int(out, self.value, self.len, self.endian);
        Ok(())
    }

    fn valid(&self) -> bool {
        !self.pending_refresh() && self.accepts(self.value)
    }

    fn refresh(&mut self) -> bool {
        let normalized = self.normalized();
        let changed = normalized != self.value;
        self.value = normalized;
        changed
    }

    fn pending_refresh(&self) -> bool {
        self.normalized() != self.value
    }
}

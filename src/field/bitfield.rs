//! Bitfield fields: several small unsigned members packed into one value

use bytes::BytesMut;

use super::bitmask::width_mask;
use super::int::{get_int, put_int};
use super::{BitOrigin, Endian, Field, FieldKind, FieldOptions, Validator};
use crate::protocol::{DefinitionError, Error, Result};

/// Ordered members of fixed bit widths packed into 1..=8 bytes.
///
/// With [`BitOrigin::Lsb`] member 0 occupies the least significant bits;
/// with [`BitOrigin::Msb`] it occupies the most significant bits of the
/// serialized width. Bits not covered by any member are written as zero.
#[derive(Debug, Clone)]
pub struct BitfieldField {
    len: usize,
    origin: BitOrigin,
    endian: Endian,
    widths: Vec<usize>,
    members: Vec<u64>,
    validator: Option<Validator<u64>>,
}

impl BitfieldField {
    /// Build a field with the given member bit widths.
    ///
    /// Without a fixed length the serialized width is the smallest byte
    /// count covering all members. The default value and validator apply to
    /// the packed representation.
    pub fn new(
        widths: &[usize],
        options: FieldOptions<u64>,
    ) -> std::result::Result<Self, DefinitionError> {
        options.check()?;
        if let Some(index) = widths.iter().position(|w| *w == 0) {
            return Err(DefinitionError::EmptyMember { index });
        }
        let total: usize = widths.iter().sum();
        let len = options.fixed_len().unwrap_or(total.div_ceil(8).max(1));
        if len == 0 || len > 8 {
            return Err(DefinitionError::InvalidLength { len, min: 1, max: 8 });
        }
        if total > len * 8 {
            return Err(DefinitionError::BitfieldOverflow {
                bits: total,
                available: len * 8,
            });
        }

        let origin = options.bit_origin();
        let endian = options.byte_order();
        let (default_value, validator) = options.into_parts();
        let mut field = Self {
            len,
            origin,
            endian,
            widths: widths.to_vec(),
            members: vec![0; widths.len()],
            validator,
        };
        if let Some(packed) = default_value {
            if packed & !field.used_mask() != 0 {
                return Err(DefinitionError::DefaultOutOfRange { bits: total });
            }
            field.unpack(packed);
        }
        Ok(field)
    }

    /// Number of members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.widths.len()
    }

    /// Bit width of member `idx`.
    #[must_use]
    pub fn member_width(&self, idx: usize) -> Option<usize> {
        self.widths.get(idx).copied()
    }

    /// Value of member `idx`.
    #[must_use]
    pub fn member(&self, idx: usize) -> Option<u64> {
        self.members.get(idx).copied()
    }

    /// Replace member `idx`. Returns `false` if there is no such member.
    ///
    /// Values wider than the member are kept until [`Field::refresh`].
    pub fn set_member(&mut self, idx: usize, value: u64) -> bool {
        match self.members.get_mut(idx) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// All member values in declared order.
    #[must_use]
    pub fn members(&self) -> &[u64] {
        &self.members
    }

    /// Packed representation.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.members
            .iter()
            .enumerate()
            .fold(0u64, |acc, (idx, value)| {
                acc | ((value & member_mask(self.widths[idx])) << self.offset(idx))
            })
    }

    /// Replace every member from a packed representation.
    pub fn set_value(&mut self, packed: u64) {
        self.unpack(packed);
    }

    fn unpack(&mut self, packed: u64) {
        for idx in 0..self.widths.len() {
            self.members[idx] = (packed >> self.offset(idx)) & member_mask(self.widths[idx]);
        }
    }

    fn offset(&self, idx: usize) -> usize {
        let before: usize = self.widths[..idx].iter().sum();
        match self.origin {
            BitOrigin::Lsb => before,
            BitOrigin::Msb => self.len * 8 - before - self.widths[idx],
        }
    }

    fn used_mask(&self) -> u64 {
        (0..self.widths.len()).fold(0u64, |acc, idx| {
            acc | (member_mask(self.widths[idx]) << self.offset(idx))
        })
    }
}

const fn member_mask(width: usize) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

impl Field for BitfieldField {
    fn kind(&self) -> FieldKind {
        FieldKind::Bitfield
    }

    fn length(&self) -> usize {
        self.len
    }

    fn read(&mut self, input: &mut &[u8]) -> Result<()> {
        if input.len() < self.len {
            return Err(Error::not_enough_data(self.len, input.len()));
        }
        let (head, rest) = input.split_at(self.len);
        let packed = (get_int(head, self.endian, false) as u64) & width_mask(self.len);
        if let Some(validator) = &self.validator {
            if !validator.check(&packed) {
                return Err(Error::invalid(format!("bitfield {packed:#x} rejected")));
            }
        }
        self.unpack(packed);
        *input = rest;
        Ok(())
    }

    fn write(&self, out: &mut BytesMut, max_len: usize) -> Result<()> {
        if max_len < self.len {
            return Err(Error::buffer_overflow(self.len, max_len));
        }
        put_int(out, i128::from(self.value()), self.len, self.endian);
        Ok(())
    }

    fn valid(&self) -> bool {
        !self.pending_refresh()
            && self
                .validator
                .as_ref()
                .is_none_or(|v| v.check(&self.value()))
    }

    fn refresh(&mut self) -> bool {
        let mut changed = false;
        for (value, width) in self.members.iter_mut().zip(&self.widths) {
            let masked = *value & member_mask(*width);
            changed |= masked != *value;
            *value = masked;
        }
        changed
    }

    fn pending_refresh(&self) -> bool {
        self.members
            .iter()
            .zip(&self.widths)
            .any(|(value, width)| value & !member_mask(*width) != 0)
    }
}

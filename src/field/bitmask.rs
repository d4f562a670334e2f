//! Bitmask fields

use bytes::BytesMut;

use super::int::{get_int, put_int};
use super::{BitOrigin, Endian, Field, FieldKind, FieldOptions, Validator};
use crate::protocol::{DefinitionError, Error, Result};

/// Default serialized length: the full `u64` representation.
pub const BITMASK_DEFAULT_LEN: usize = 8;

/// Set of independent flag bits packed into 1..=8 bytes.
///
/// Bit index 0 is the least significant bit unless the field was defined
/// with [`BitOrigin::Msb`], in which case it is the most significant bit of
/// the serialized width.
#[derive(Debug, Clone)]
pub struct BitmaskField {
    len: usize,
    origin: BitOrigin,
    endian: Endian,
    bits: u64,
    validator: Option<Validator<u64>>,
}

impl BitmaskField {
    /// Build a field from resolved options.
    pub fn new(options: FieldOptions<u64>) -> std::result::Result<Self, DefinitionError> {
        options.check()?;
        let len = options.fixed_len().unwrap_or(BITMASK_DEFAULT_LEN);
        if len == 0 || len > BITMASK_DEFAULT_LEN {
            return Err(DefinitionError::InvalidLength {
                len,
                min: 1,
                max: BITMASK_DEFAULT_LEN,
            });
        }
        let origin = options.bit_origin();
        let endian = options.byte_order();
        let (default_value, validator) = options.into_parts();
        let bits = default_value.unwrap_or(0);
        if bits & !width_mask(len) != 0 {
            return Err(DefinitionError::DefaultOutOfRange { bits: len * 8 });
        }

        Ok(Self {
            len,
            origin,
            endian,
            bits,
            validator,
        })
    }

    /// Raw bits, LSB-aligned.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.bits
    }

    /// Replace all bits.
    pub fn set_value(&mut self, bits: u64) {
        self.bits = bits;
    }

    /// Bit index origin.
    #[must_use]
    pub const fn bit_origin(&self) -> BitOrigin {
        self.origin
    }

    fn mask_of(&self, idx: usize) -> Option<u64> {
        let width = self.len * 8;
        if idx >= width {
            return None;
        }
        let shift = match self.origin {
            BitOrigin::Lsb => idx,
            BitOrigin::Msb => width - 1 - idx,
        };
        Some(1u64 << shift)
    }

    /// Value of bit `idx`; out-of-range indices read as unset.
    #[must_use]
    pub fn bit(&self, idx: usize) -> bool {
        self.mask_of(idx).is_some_and(|m| self.bits & m != 0)
    }

    /// Set or clear bit `idx`. Returns `false` if the index is out of range.
    pub fn set_bit(&mut self, idx: usize, value: bool) -> bool {
        let Some(mask) = self.mask_of(idx) else {
            return false;
        };
        if value {
            self.bits |= mask;
        } else {
            self.bits &= !mask;
        }
        true
    }

    /// Set every bit present in `mask`.
    pub fn set_bits(&mut self, mask: u64) {
        self.bits |= mask;
    }

    /// Clear every bit present in `mask`.
    pub fn clear_bits(&mut self, mask: u64) {
        self.bits &= !mask;
    }

    /// True if all bits of `mask` are set.
    #[must_use]
    pub const fn has_all_bits(&self, mask: u64) -> bool {
        self.bits & mask == mask
    }

    /// True if any bit of `mask` is set.
    #[must_use]
    pub const fn has_any_bits(&self, mask: u64) -> bool {
        self.bits & mask != 0
    }
}

pub(crate) const fn width_mask(len: usize) -> u64 {
    if len >= 8 {
        u64::MAX
    } else {
        (1u64 << (len * 8)) - 1
    }
}

impl Field for BitmaskField {
    fn kind(&self) -> FieldKind {
        FieldKind::Bitmask
    }

    fn length(&self) -> usize {
        self.len
    }

    fn read(&mut self, input: &mut &[u8]) -> Result<()> {
        if input.len() < self.len {
            return Err(Error::not_enough_data(self.len, input.len()));
        }
        let (head, rest) = input.split_at(self.len);
        let bits = get_int(head, self.endian, false) as u64;
        if let Some(validator) = &self.validator {
            if !validator.check(&bits) {
                return Err(Error::invalid(format!("bitmask {bits:#x} rejected")));
            }
        }
        self.bits = bits;
        *input = rest;
        Ok(())
    }

    fn write(&self, out: &mut BytesMut, max_len: usize) -> Result<()> {
        if max_len < self.len {
            return Err(Error::buffer_overflow(self.len, max_len));
        }
        put_int(out, i128::from(self.bits), self.len, self.endian);
        Ok(())
    }

    fn valid(&self) -> bool {
        !self.pending_refresh() && self.validator.as_ref().is_none_or(|v| v.check(&self.bits))
    }

    fn refresh(&mut self) -> bool {
        let masked = self.bits & width_mask(self.len);
        let changed = masked != self.bits;
        self.bits = masked;
        changed
    }

    fn pending_refresh(&self) -> bool {
        self.bits & !width_mask(self.len) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_byte(origin_msb: bool) -> BitmaskField {
        let opts = FieldOptions::new().fixed_length(1);
        let opts = if origin_msb { opts.msb_first() } else { opts };
        BitmaskField::new(opts).unwrap()
    }

    #[test]
    fn test_baseline_is_eight_bytes_lsb_first() {
        let mut field = BitmaskField::new(FieldOptions::new()).unwrap();
        assert_eq!(field.length(), 8);
        assert_eq!(field.bit_origin(), BitOrigin::Lsb);
        field.set_bit(0, true);
        assert_eq!(field.value(), 1);
    }

    #[test]
    fn test_msb_origin_maps_bit_zero_to_top() {
        let mut field = one_byte(true);
        assert!(field.set_bit(0, true));
        assert_eq!(field.value(), 0x80);
        assert!(field.bit(0));
        assert!(!field.bit(7));

        let mut out = BytesMut::new();
        field.write(&mut out, 1).unwrap();
        assert_eq!(out.as_ref(), &[0x80]);
    }

    #[test]
    fn test_out_of_range_bit() {
        let mut field = one_byte(false);
        assert!(!field.set_bit(8, true));
        assert!(!field.bit(8));
        assert_eq!(field.value(), 0);
    }

    #[test]
    fn test_set_and_clear_bits() {
        let mut field = one_byte(false);
        field.set_bits(0b0110);
        assert!(field.has_all_bits(0b0110));
        assert!(field.has_any_bits(0b0010));
        field.clear_bits(0b0100);
        assert!(!field.has_all_bits(0b0110));
        assert_eq!(field.value(), 0b0010);
    }

    #[test]
    fn test_refresh_clears_bits_above_width() {
        let mut field = BitmaskField::new(FieldOptions::new().fixed_length(2)).unwrap();
        field.set_value(0x1_0001);
        assert!(!field.valid());
        assert!(field.refresh());
        assert_eq!(field.value(), 0x0001);
        assert!(!field.refresh());
        assert!(field.valid());
    }

    #[test]
    fn test_read_validator() {
        let mut field = BitmaskField::new(
            FieldOptions::new()
                .fixed_length(1)
                .validator(|bits| bits & 0xF0 == 0),
        )
        .unwrap();
        let mut bad: &[u8] = &[0x10];
        assert!(matches!(
            field.read(&mut bad),
            Err(Error::InvalidMsgData { .. })
        ));
        let mut good: &[u8] = &[0x05];
        field.read(&mut good).unwrap();
        assert_eq!(field.value(), 0x05);
        assert!(good.is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn build(len: usize, msb: bool, little: bool) -> BitmaskField {
            let endian = if little { Endian::Little } else { Endian::Big };
            let opts = FieldOptions::new().fixed_length(len).endian(endian);
            let opts = if msb { opts.msb_first() } else { opts };
            BitmaskField::new(opts).unwrap()
        }

        fn encoded(field: &BitmaskField) -> Vec<u8> {
            let mut out = BytesMut::new();
            field.write(&mut out, usize::MAX).unwrap();
            out.to_vec()
        }

        proptest! {
            /// A bitmask always emits exactly `length()` bytes.
            #[test]
            fn prop_write_emits_length_bytes(
                bits in any::<u64>(),
                len in 1usize..=8,
                msb in any::<bool>(),
                little in any::<bool>(),
            ) {
                let mut field = build(len, msb, little);
                field.set_value(bits);
                prop_assert_eq!(encoded(&field).len(), len);
            }

            /// Refreshed bits survive write -> read -> write unchanged.
            #[test]
            fn prop_refreshed_roundtrip(
                bits in any::<u64>(),
                len in 1usize..=8,
                msb in any::<bool>(),
                little in any::<bool>(),
            ) {
                let mut field = build(len, msb, little);
                field.set_value(bits);
                field.refresh();
                let first = encoded(&field);

                let mut other = build(len, msb, little);
                let mut input = first.as_slice();
                other.read(&mut input).unwrap();
                prop_assert!(input.is_empty());
                prop_assert_eq!(other.value(), field.value());
                prop_assert_eq!(encoded(&other), first);
            }
        }
    }
}

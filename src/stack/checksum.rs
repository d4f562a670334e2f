//! Checksum trailer

use bytes::BytesMut;
use crc::{CRC_16_IBM_3740, Crc};
use tracing::trace;
use xxhash_rust::xxh3::xxh3_64;

use super::{DecodeContext, Layer, LayerKind, Next, widen};
use crate::field::{AnyField, Endian, Field, FieldOptions, IntField, IntType};
use crate::protocol::{DefinitionError, Error, MessageSet, Result};

/// Checksum algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChecksumKind {
    /// 8-bit wrapping byte sum
    Sum8,
    /// 16-bit wrapping byte sum
    Sum16,
    /// 8-bit XOR of all bytes
    Xor8,
    /// CRC-16/CCITT-FALSE (poly `0x1021`, init `0xFFFF`)
    Crc16Ccitt,
    /// CRC-32 (IEEE 802.3)
    Crc32,
    /// 64-bit XXH3
    Xxh3,
}

impl ChecksumKind {
    /// Serialized width in bytes.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Sum8 | Self::Xor8 => 1,
            Self::Sum16 | Self::Crc16Ccitt => 2,
            Self::Crc32 => 4,
            Self::Xxh3 => 8,
        }
    }

    /// Checksum of `data`.
    #[must_use]
    pub fn compute(self, data: &[u8]) -> u64 {
        match self {
            Self::Sum8 => u64::from(data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))),
            Self::Sum16 => u64::from(
                data.iter()
                    .fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b))),
            ),
            Self::Xor8 => u64::from(data.iter().fold(0u8, |acc, b| acc ^ b)),
            Self::Crc16Ccitt => u64::from(CRC16_CCITT.checksum(data)),
            Self::Crc32 => u64::from(crc32fast::hash(data)),
            Self::Xxh3 => xxh3_64(data),
        }
    }
}

const CRC16_CCITT: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Appends a checksum over the bytes of the inner layers.
#[derive(Debug, Clone)]
pub struct ChecksumLayer {
    kind: ChecksumKind,
    field: IntField,
}

impl ChecksumLayer {
    /// Big-endian checksum trailer.
    #[must_use]
    pub fn new(kind: ChecksumKind) -> Self {
        Self {
            kind,
            field: IntField::of(IntType::unsigned_for(kind.width())),
        }
    }

    /// Checksum trailer in the given byte order.
    pub fn with_endian(kind: ChecksumKind, endian: Endian) -> std::result::Result<Self, DefinitionError> {
        let field = IntField::new(
            IntType::unsigned_for(kind.width()),
            FieldOptions::new().endian(endian),
        )?;
        Ok(Self { kind, field })
    }

    /// Algorithm.
    #[must_use]
    pub const fn checksum_kind(&self) -> ChecksumKind {
        self.kind
    }
}

impl<M: MessageSet> Layer<M> for ChecksumLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Checksum
    }

    fn encode(&self, message: &M, out: &mut BytesMut, next: Next<'_, M>) -> Result<()> {
        let start = out.len();
        next.encode(message, out)?;
        let mut field = self.field.clone();
        field.set_unsigned_value(u128::from(self.kind.compute(&out[start..])));
        field.write(out, usize::MAX)
    }

    fn decode(
        &self,
        input: &[u8],
        ctx: &mut DecodeContext<M>,
        next: Next<'_, M>,
    ) -> Result<usize> {
        let width = self.kind.width();
        let window = &input[..input.len().saturating_sub(width)];
        let used = next
            .decode(window, ctx)
            .map_err(|err| widen(err, input.len() - window.len()))?;

        let mut field = self.field.clone();
        let mut trailer = &input[used..];
        field.read(&mut trailer).map_err(|err| widen(err, used))?;

        #[allow(clippy::cast_possible_truncation)]
        let found = field.unsigned_value() as u64;
        let expected = self.kind.compute(&input[..used]);
        if found != expected {
            trace!(expected, found, kind = ?self.kind, "checksum mismatch");
            return Err(Error::ChecksumMismatch { expected, found });
        }
        ctx.record(LayerKind::Checksum, || field.into());
        Ok(used + width)
    }

    fn transport_field(&self) -> AnyField {
        self.field.clone().into()
    }

    fn is_trailer(&self) -> bool {
        true
    }
}

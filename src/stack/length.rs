//! Length prefix

use bytes::BytesMut;
use tracing::trace;

use super::{DecodeContext, Layer, LayerKind, Next, widen};
use crate::field::{AnyField, Endian, Field, FieldOptions, IntField, IntType};
use crate::protocol::{DefinitionError, Error, MessageSet, Result};

/// Prefixes the inner layers with their serialized length.
///
/// The value on the wire is `inner_len + offset`, so protocols whose length
/// also counts framing bytes (or a trailing checksum) can be described with a
/// positive offset. On read the declared window is authoritative: the inner
/// layers must consume it exactly.
#[derive(Debug, Clone)]
pub struct LengthLayer {
    field: IntField,
    offset: usize,
    max: usize,
}

impl LengthLayer {
    /// Big-endian length of `width` bytes (1..=8).
    pub fn new(width: usize) -> std::result::Result<Self, DefinitionError> {
        Self::with_endian(width, Endian::Big)
    }

    /// Length of `width` bytes in the given byte order.
    pub fn with_endian(width: usize, endian: Endian) -> std::result::Result<Self, DefinitionError> {
        let field = IntField::new(
            IntType::U64,
            FieldOptions::new().fixed_length(width).endian(endian),
        )?;
        Ok(Self {
            field,
            offset: 0,
            max: capacity(width),
        })
    }

    /// Add `offset` to the written length.
    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Reject inner windows longer than `max` bytes.
    #[must_use]
    pub fn max_len(mut self, max: usize) -> Self {
        self.max = max.min(capacity(self.width()));
        self
    }

    /// Serialized width in bytes.
    #[must_use]
    pub fn width(&self) -> usize {
        self.field.length()
    }

    /// Largest accepted inner length.
    #[must_use]
    pub fn max(&self) -> usize {
        self.max
    }
}

fn capacity(width: usize) -> usize {
    if width >= 8 {
        usize::MAX
    } else {
        usize::try_from((1u64 << (width * 8)) - 1).unwrap_or(usize::MAX)
    }
}

impl<M: MessageSet> Layer<M> for LengthLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Length
    }

    fn encode(&self, message: &M, out: &mut BytesMut, next: Next<'_, M>) -> Result<()> {
        let mut inner = BytesMut::with_capacity(message.length());
        next.encode(message, &mut inner)?;

        let body = inner.len();
        let declared = body.saturating_add(self.offset);
        if body > self.max || declared > capacity(self.width()) {
            return Err(Error::FrameTooLarge {
                size: body,
                max: self.max,
            });
        }
        let mut field = self.field.clone();
        field.set_unsigned_value(declared as u128);
        field.write(out, usize::MAX)?;
        out.extend_from_slice(&inner);
        Ok(())
    }

    fn decode(
        &self,
        input: &[u8],
        ctx: &mut DecodeContext<M>,
        next: Next<'_, M>,
    ) -> Result<usize> {
        let mut field = self.field.clone();
        let mut cursor = input;
        field.read(&mut cursor)?;

        let head = self.width();
        let declared = usize::try_from(field.unsigned_value()).unwrap_or(usize::MAX);
        let Some(body) = declared.checked_sub(self.offset) else {
            return Err(Error::LengthMismatch {
                declared,
                actual: self.offset,
            });
        };
        if body > self.max {
            trace!(body, max = self.max, "declared length above limit");
            return Err(Error::FrameTooLarge {
                size: body,
                max: self.max,
            });
        }
        if cursor.len() < body {
            return Err(Error::not_enough_data(head + body, input.len()));
        }
        ctx.record(LayerKind::Length, || field.into());

        match next.decode(&cursor[..body], ctx) {
            Ok(used) if used == body => Ok(head + body),
            Ok(used) => Err(Error::LengthMismatch {
                declared: body,
                actual: used,
            }),
            Err(Error::NotEnoughData { needed, .. }) => Err(Error::LengthMismatch {
                declared: body,
                actual: needed,
            }),
            Err(err) => Err(widen(err, head)),
        }
    }

    fn transport_field(&self) -> AnyField {
        self.field.clone().into()
    }
}

//! Message id prefix

use bytes::BytesMut;
use tracing::trace;

use super::{DecodeContext, Layer, LayerKind, Next, widen};
use crate::field::{AnyField, Endian, Field, FieldOptions, IntField, IntType};
use crate::protocol::{DefinitionError, Error, MessageSet, Result};

/// Writes the message id and, on read, instantiates the matching message.
#[derive(Debug, Clone)]
pub struct IdLayer {
    field: IntField,
}

impl IdLayer {
    /// Big-endian id of `width` bytes (1..=8).
    pub fn new(width: usize) -> std::result::Result<Self, DefinitionError> {
        Self::with_endian(width, Endian::Big)
    }

    /// Id of `width` bytes in the given byte order.
    pub fn with_endian(width: usize, endian: Endian) -> std::result::Result<Self, DefinitionError> {
        let field = IntField::new(
            IntType::U64,
            FieldOptions::new().fixed_length(width).endian(endian),
        )?;
        Ok(Self { field })
    }

    /// Serialized width in bytes.
    #[must_use]
    pub fn width(&self) -> usize {
        self.field.length()
    }

    fn fits(&self, id: u64) -> bool {
        let bits = self.width() * 8;
        bits >= 64 || id >> bits == 0
    }
}

impl<M: MessageSet> Layer<M> for IdLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Id
    }

    fn encode(&self, message: &M, out: &mut BytesMut, next: Next<'_, M>) -> Result<()> {
        let id = message.id();
        if !self.fits(id) {
            return Err(Error::invalid(format!(
                "message id {id:#x} does not fit in {} bytes",
                self.width()
            )));
        }
        let mut field = self.field.clone();
        field.set_unsigned_value(u128::from(id));
        field.write(out, usize::MAX)?;
        next.encode(message, out)
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

        #[allow(clippy::cast_possible_truncation)]
        let id = field.unsigned_value() as u64;
        let Some(message) = M::from_id(id) else {
            trace!(id, "no message registered for id");
            return Err(Error::UnknownMessageId { id });
        };
        ctx.set_id(id);
        ctx.set_message(message);
        ctx.record(LayerKind::Id, || field.into());

        let head = self.width();
        let used = next
            .decode(&input[head..], ctx)
            .map_err(|err| widen(err, head))?;
        Ok(head + used)
    }

    fn transport_field(&self) -> AnyField {
        self.field.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Message;
    use crate::stack::tests::Raw;
    use crate::stack::{PayloadLayer, Stack};

    fn stack(width: usize, endian: Endian) -> Stack<Raw> {
        Stack::builder()
            .layer(IdLayer::with_endian(width, endian).unwrap())
            .layer(PayloadLayer)
            .build()
            .unwrap()
    }

    #[test]
    fn test_width_bounds() {
        assert!(IdLayer::new(0).is_err());
        assert!(IdLayer::new(9).is_err());
        assert_eq!(IdLayer::new(8).unwrap().width(), 8);
    }

    #[test]
    fn test_id_byte_order() {
        let frame = stack(2, Endian::Little)
            .encode(&Raw::new(0x12, &[0xFF]))
            .unwrap();
        assert_eq!(frame.as_ref(), &[0x12, 0x00, 0xFF]);

        let frame = stack(2, Endian::Big)
            .encode(&Raw::new(0x12, &[0xFF]))
            .unwrap();
        assert_eq!(frame.as_ref(), &[0x00, 0x12, 0xFF]);
    }

    #[test]
    fn test_unknown_id() {
        let err = stack(1, Endian::Big).decode(&[0x90, 0x01]).unwrap_err();
        assert_eq!(err, Error::UnknownMessageId { id: 0x90 });
    }

    #[test]
    fn test_decoded_message_carries_id() {
        let (msg, used) = stack(1, Endian::Big).decode(&[0x21, 0x01, 0x02]).unwrap();
        assert_eq!(msg.id(), 0x21);
        assert_eq!(msg.payload(), &[0x01, 0x02]);
        assert_eq!(used, 3);
    }

    #[test]
    fn test_empty_input_needs_more_data() {
        let err = stack(2, Endian::Big).decode(&[]).unwrap_err();
        assert_eq!(err, Error::not_enough_data(2, 0));
    }
}

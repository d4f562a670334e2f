//! Message body

use bytes::BytesMut;

use super::{DecodeContext, Layer, LayerKind, Next};
use crate::field::{AnyField, BlobField};
use crate::protocol::{Error, MessageSet, Result};

/// Innermost layer: the message's own fields.
///
/// On read the message instantiated by an enclosing [`IdLayer`] is filled
/// in; without one, the message for id `0` is used.
///
/// [`IdLayer`]: super::IdLayer
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadLayer;

impl<M: MessageSet> Layer<M> for PayloadLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Payload
    }

    fn encode(&self, message: &M, out: &mut BytesMut, _next: Next<'_, M>) -> Result<()> {
        message.write(out, usize::MAX)
    }

    fn decode(
        &self,
        input: &[u8],
        ctx: &mut DecodeContext<M>,
        _next: Next<'_, M>,
    ) -> Result<usize> {
        let mut message = match ctx.take_message() {
            Some(message) => message,
            None => {
                let id = ctx.id().unwrap_or_default();
                M::from_id(id).ok_or(Error::UnknownMessageId { id })?
            }
        };
        let mut cursor = input;
        message.read(&mut cursor)?;
        let used = input.len() - cursor.len();

        ctx.record(LayerKind::Payload, || {
            let mut blob = BlobField::variable();
            blob.set_value(&input[..used]);
            blob.into()
        });
        ctx.set_message(message);
        Ok(used)
    }

    fn transport_field(&self) -> AnyField {
        BlobField::variable().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldOptions, IntField, IntType};
    use crate::protocol::{FieldMessage, Message};
    use crate::stack::Stack;

    #[derive(Debug)]
    struct Word(FieldMessage);

    impl Message for Word {
        fn id(&self) -> u64 {
            0
        }

        fn name(&self) -> &'static str {
            "Word"
        }

        fn fields(&self) -> &[AnyField] {
            self.0.fields()
        }

        fn fields_mut(&mut self) -> &mut [AnyField] {
            self.0.fields_mut()
        }
    }

    impl MessageSet for Word {
        fn from_id(id: u64) -> Option<Self> {
            let field = IntField::new(
                IntType::U16,
                FieldOptions::new().validator(|v: &i128| *v != 0xFFFF),
            )
            .ok()?;
            (id == 0).then(|| Self(FieldMessage::new(0, "Word", [field.into()])))
        }
    }

    fn stack() -> Stack<Word> {
        Stack::builder().layer(PayloadLayer).build().unwrap()
    }

    #[test]
    fn test_payload_only_stack() {
        let (msg, used) = stack().decode(&[0x12, 0x34, 0x56]).unwrap();
        assert_eq!(used, 2);
        let value = msg.fields()[0].as_int().map(IntField::value);
        assert_eq!(value, Some(0x1234));
    }

    #[test]
    fn test_field_errors_propagate() {
        assert_eq!(
            stack().decode(&[0x12]).unwrap_err(),
            Error::not_enough_data(2, 1)
        );
        assert_eq!(
            stack().decode(&[0xFF, 0xFF]).unwrap_err().status(),
            crate::protocol::ErrorStatus::InvalidMsgData
        );
    }

    #[test]
    fn test_inspect_records_payload_bytes() {
        let inspected = stack().inspect(&[0xAB, 0xCD]).unwrap();
        assert_eq!(inspected.payload(), Some(&[0xAB, 0xCD][..]));
        assert_eq!(inspected.message_id(), None);
    }
}

//! Framing fields as a message

use super::LayerKind;
use crate::field::{AnyField, BlobField};
use crate::protocol::Message;

/// The framing fields of one stack, in wire order.
///
/// Built either as default-initialized prototypes by
/// [`Stack::transport_message`](super::Stack::transport_message) or filled in
/// from a received frame by [`Stack::inspect`](super::Stack::inspect). The
/// payload is carried as an opaque blob.
#[derive(Debug, Clone)]
pub struct TransportMessage {
    kinds: Vec<LayerKind>,
    fields: Vec<AnyField>,
}

impl TransportMessage {
    pub(crate) fn from_parts(parts: Vec<(LayerKind, AnyField)>) -> Self {
        let (kinds, fields) = parts.into_iter().unzip();
        Self { kinds, fields }
    }

    /// Layer role of each field.
    #[must_use]
    pub fn layer_kinds(&self) -> &[LayerKind] {
        &self.kinds
    }

    /// First field written by a layer of `kind`.
    #[must_use]
    pub fn field(&self, kind: LayerKind) -> Option<&AnyField> {
        let idx = self.kinds.iter().position(|k| *k == kind)?;
        self.fields.get(idx)
    }

    /// Mutable access to the first field of `kind`.
    pub fn field_mut(&mut self, kind: LayerKind) -> Option<&mut AnyField> {
        let idx = self.kinds.iter().position(|k| *k == kind)?;
        self.fields.get_mut(idx)
    }

    /// Payload bytes.
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        self.field(LayerKind::Payload)
            .and_then(AnyField::as_blob)
            .map(BlobField::value)
    }

    /// Message id, when the stack has an id layer.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn message_id(&self) -> Option<u64> {
        self.field(LayerKind::Id)
            .and_then(AnyField::as_int)
            .map(|field| field.unsigned_value() as u64)
    }

    /// Checksum carried by the frame.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn checksum(&self) -> Option<u64> {
        self.field(LayerKind::Checksum)
            .and_then(AnyField::as_int)
            .map(|field| field.unsigned_value() as u64)
    }
}

impl Message for TransportMessage {
    fn id(&self) -> u64 {
        self.message_id().unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "TransportMessage"
    }

    fn fields(&self) -> &[AnyField] {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut [AnyField] {
        &mut self.fields
    }
}

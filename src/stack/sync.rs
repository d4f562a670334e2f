//! Start-of-frame marker

use bytes::BytesMut;

use super::{DecodeContext, Layer, LayerKind, Next, widen};
use crate::field::{AnyField, BlobField, Field, FieldOptions};
use crate::protocol::{DefinitionError, Error, MessageSet, Result};

/// Fixed byte pattern written before every frame and checked on read.
#[derive(Debug, Clone)]
pub struct SyncLayer {
    field: BlobField,
}

impl SyncLayer {
    /// Layer for a non-empty pattern.
    pub fn new(pattern: impl Into<Vec<u8>>) -> std::result::Result<Self, DefinitionError> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(DefinitionError::InvalidStack {
                reason: "sync pattern is empty",
            });
        }
        let field = BlobField::new(
            FieldOptions::new()
                .fixed_length(pattern.len())
                .default_value(pattern),
        )?;
        Ok(Self { field })
    }

    /// The pattern bytes.
    #[must_use]
    pub fn pattern(&self) -> &[u8] {
        self.field.value()
    }
}

impl<M: MessageSet> Layer<M> for SyncLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Sync
    }

    fn encode(&self, message: &M, out: &mut BytesMut, next: Next<'_, M>) -> Result<()> {
        self.field.write(out, usize::MAX)?;
        next.encode(message, out)
    }

    fn decode(
        &self,
        input: &[u8],
        ctx: &mut DecodeContext<M>,
        next: Next<'_, M>,
    ) -> Result<usize> {
        let pattern = self.pattern();
        if let Some(offset) = input
            .iter()
            .zip(pattern)
            .position(|(got, want)| got != want)
        {
            return Err(Error::SyncMismatch { offset });
        }
        if input.len() < pattern.len() {
            return Err(Error::not_enough_data(pattern.len(), input.len()));
        }
        ctx.record(LayerKind::Sync, || self.field.clone().into());

        let head = pattern.len();
        let used = next
            .decode(&input[head..], ctx)
            .map_err(|err| widen(err, head))?;
        Ok(head + used)
    }

    fn transport_field(&self) -> AnyField {
        self.field.clone().into()
    }

    fn sync_pattern(&self) -> Option<&[u8]> {
        Some(self.pattern())
    }
}

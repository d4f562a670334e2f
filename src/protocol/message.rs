//! Messages: ordered field aggregates with a type id

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::adapter::FieldAdapter;
use crate::field::{AnyField, Field};
use crate::util::{accumulate, try_for_each};

use super::{Error, Result};

/// An ordered, fixed list of fields plus an immutable type id.
///
/// Implementors only supply the id, name and field storage; every codec
/// operation is provided and walks the fields in declared order.
pub trait Message: fmt::Debug {
    /// Numeric type id.
    fn id(&self) -> u64;

    /// Human readable name.
    fn name(&self) -> &'static str;

    /// Fields in declared order.
    fn fields(&self) -> &[AnyField];

    /// Mutable fields in declared order.
    fn fields_mut(&mut self) -> &mut [AnyField];

    /// Serialized length of all fields.
    fn length(&self) -> usize {
        accumulate(self.fields(), 0, |len, field| len + field.length())
    }

    /// Every field is valid and nothing is waiting for a refresh.
    fn valid(&self) -> bool {
        accumulate(self.fields(), true, |ok, field| {
            ok && field.valid() && !field.pending_refresh()
        })
    }

    /// Refresh every field; `true` if any field changed.
    fn refresh(&mut self) -> bool {
        accumulate(self.fields_mut(), false, |changed, field| {
            field.refresh() || changed
        })
    }

    /// Read every field from the front of `input`.
    ///
    /// Stops at the first failing field. `input` only advances on success.
    fn read(&mut self, input: &mut &[u8]) -> Result<()> {
        let mut cursor = *input;
        try_for_each(self.fields_mut(), |field| field.read(&mut cursor))?;
        *input = cursor;
        Ok(())
    }

    /// Write every field. On failure nothing is left appended to `out`.
    fn write(&self, out: &mut BytesMut, max_len: usize) -> Result<()> {
        let needed = self.length();
        if max_len < needed {
            return Err(Error::buffer_overflow(needed, max_len));
        }
        let start = out.len();
        let res = try_for_each(self.fields(), |field| {
            let used = out.len() - start;
            field.write(out, max_len - used)
        });
        if res.is_err() {
            out.truncate(start);
        }
        res
    }

    /// Refresh once, then serialize all fields into a fresh buffer.
    fn encode(&mut self) -> Result<Bytes> {
        self.refresh();
        let mut out = BytesMut::with_capacity(self.length());
        self.write(&mut out, usize::MAX)?;
        Ok(out.freeze())
    }

    /// Decode all fields from `bytes`, returning the number consumed.
    ///
    /// Success only means every field could be read; call
    /// [`Message::refresh`] and [`Message::valid`] before trusting the values.
    fn decode(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut input = bytes;
        self.read(&mut input)?;
        Ok(bytes.len() - input.len())
    }

    /// One adapter per field, in declared order.
    fn adapters(&mut self) -> Vec<Box<dyn FieldAdapter + '_>> {
        self.fields_mut().iter_mut().map(AnyField::adapter).collect()
    }
}

/// A family of messages that can be instantiated from a wire id.
pub trait MessageSet: Message + Sized {
    /// Default-initialized message for `id`, or `None` if the id is unknown.
    fn from_id(id: u64) -> Option<Self>;
}

/// Receives decoded messages.
///
/// Message families usually route each variant to one callback of their own
/// visitor trait, with a fallback for variants that have no dedicated
/// callback; implementing this trait is where that routing happens.
pub trait Handler<M: ?Sized> {
    /// Handle one fully decoded, valid message.
    fn handle(&mut self, message: &M);
}

/// Handler that ignores every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl<M: ?Sized> Handler<M> for NoopHandler {
    fn handle(&mut self, _message: &M) {}
}

/// Handler backed by a closure. See [`handler_fn`].
#[derive(Clone)]
pub struct FnHandler<F>(F);

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// Wrap a closure as a [`Handler`].
pub fn handler_fn<M: ?Sized, F: FnMut(&M)>(func: F) -> FnHandler<F> {
    FnHandler(func)
}

impl<M: ?Sized, F: FnMut(&M)> Handler<M> for FnHandler<F> {
    fn handle(&mut self, message: &M) {
        (self.0)(message);
    }
}

/// General-purpose message built from a runtime field list.
#[derive(Debug, Clone)]
pub struct FieldMessage {
    id: u64,
    name: &'static str,
    fields: Vec<AnyField>,
}

impl FieldMessage {
    /// Create a message from its fields.
    pub fn new(id: u64, name: &'static str, fields: impl IntoIterator<Item = AnyField>) -> Self {
        Self {
            id,
            name,
            fields: fields.into_iter().collect(),
        }
    }

    /// Field at `idx`.
    #[must_use]
    pub fn field(&self, idx: usize) -> Option<&AnyField> {
        self.fields.get(idx)
    }

    /// Mutable field at `idx`.
    pub fn field_mut(&mut self, idx: usize) -> Option<&mut AnyField> {
        self.fields.get_mut(idx)
    }
}

impl Message for FieldMessage {
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn fields(&self) -> &[AnyField] {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut [AnyField] {
        &mut self.fields
    }
}

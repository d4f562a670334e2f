//! Framing stacks
//!
//! A stack is an ordered chain of layers, outermost first, wrapped around a
//! payload message. Each layer writes or reads its own field(s) and hands
//! the rest of the work to the next layer through [`Next`].
//!
//! ```text
//! [SYNC] [ID] [LENGTH] [PAYLOAD (LENGTH bytes)] [CHECKSUM]
//! ```
//!
//! Decoding is tri-state: `Ok`, a recoverable [`Error::NotEnoughData`], or a
//! terminal error after which the caller drops the frame start and
//! resynchronizes with [`Stack::find_frame_start`].

mod checksum;
mod id;
mod length;
mod payload;
mod sync;
mod transport;

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::field::AnyField;
use crate::protocol::{DefinitionError, Error, MessageSet, Result};

pub use checksum::{ChecksumKind, ChecksumLayer};
pub use id::IdLayer;
pub use length::LengthLayer;
pub use payload::PayloadLayer;
pub use sync::SyncLayer;
pub use transport::TransportMessage;

/// Framing role of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Fixed start-of-frame pattern
    Sync,
    /// Message type id
    Id,
    /// Length of the inner layers
    Length,
    /// Checksum over the inner layers
    Checksum,
    /// Message fields
    Payload,
}

impl LayerKind {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Id => "id",
            Self::Length => "length",
            Self::Checksum => "checksum",
            Self::Payload => "payload",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One framing role in a [`Stack`].
pub trait Layer<M>: fmt::Debug {
    /// Framing role.
    fn kind(&self) -> LayerKind;

    /// Append this layer's bytes for `message`, delegating the inner part
    /// to `next`.
    fn encode(&self, message: &M, out: &mut BytesMut, next: Next<'_, M>) -> Result<()>;

    /// Decode from the front of `input`, delegating the inner part to
    /// `next`. Returns the number of bytes consumed by this layer and every
    /// layer inside it.
    fn decode(&self, input: &[u8], ctx: &mut DecodeContext<M>, next: Next<'_, M>)
    -> Result<usize>;

    /// Default-initialized copy of this layer's field.
    fn transport_field(&self) -> AnyField;

    /// Whether this layer's field follows the inner layers on the wire.
    fn is_trailer(&self) -> bool {
        false
    }

    /// Start-of-frame pattern, for layers that have one.
    fn sync_pattern(&self) -> Option<&[u8]> {
        None
    }
}

/// Cursor over the layers inside the current one.
pub struct Next<'a, M> {
    layers: &'a [Box<dyn Layer<M>>],
}

impl<M> fmt::Debug for Next<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.layers.len())
            .finish()
    }
}

impl<'a, M: MessageSet> Next<'a, M> {
    fn new(layers: &'a [Box<dyn Layer<M>>]) -> Self {
        Self { layers }
    }

    /// Encode through the remaining layers.
    pub fn encode(self, message: &M, out: &mut BytesMut) -> Result<()> {
        match self.layers.split_first() {
            Some((layer, rest)) => layer.encode(message, out, Next::new(rest)),
            None => Err(Error::MissingPayloadLayer),
        }
    }

    /// Decode through the remaining layers.
    pub fn decode(self, input: &[u8], ctx: &mut DecodeContext<M>) -> Result<usize> {
        match self.layers.split_first() {
            Some((layer, rest)) => layer.decode(input, ctx, Next::new(rest)),
            None => Err(Error::MissingPayloadLayer),
        }
    }

    /// True once no layers remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// State shared by the layers while one frame is decoded.
#[derive(Debug)]
pub struct DecodeContext<M> {
    id: Option<u64>,
    message: Option<M>,
    recorded: Option<Vec<(LayerKind, AnyField)>>,
}

impl<M> DecodeContext<M> {
    fn new(record: bool) -> Self {
        Self {
            id: None,
            message: None,
            recorded: record.then(Vec::new),
        }
    }

    /// Message id read so far.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Remember the message id.
    pub fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    /// Store the message being decoded.
    pub fn set_message(&mut self, message: M) {
        self.message = Some(message);
    }

    /// Take the message being decoded.
    pub fn take_message(&mut self) -> Option<M> {
        self.message.take()
    }

    /// Record a decoded framing field, when the decode is an inspection.
    pub fn record(&mut self, kind: LayerKind, field: impl FnOnce() -> AnyField) {
        if let Some(recorded) = self.recorded.as_mut() {
            recorded.push((kind, field()));
        }
    }
}

/// Shift a short-input error from an inner window to the enclosing one.
pub(crate) fn widen(err: Error, by: usize) -> Error {
    match err {
        Error::NotEnoughData { needed, available } => Error::NotEnoughData {
            needed: needed + by,
            available: available + by,
        },
        other => other,
    }
}

/// Ordered chain of layers producing and consuming complete frames.
#[derive(Debug)]
pub struct Stack<M> {
    layers: Vec<Box<dyn Layer<M>>>,
}

impl<M: MessageSet> Stack<M> {
    /// Validate and build a stack from layers, outermost first.
    ///
    /// Exactly one payload layer is required and it must be innermost; a
    /// sync layer, if present, must be outermost.
    pub fn new(layers: Vec<Box<dyn Layer<M>>>) -> std::result::Result<Self, DefinitionError> {
        let payloads = layers
            .iter()
            .filter(|l| l.kind() == LayerKind::Payload)
            .count();
        if payloads != 1 {
            return Err(DefinitionError::InvalidStack {
                reason: "exactly one payload layer required",
            });
        }
        if layers.last().map(|l| l.kind()) != Some(LayerKind::Payload) {
            return Err(DefinitionError::InvalidStack {
                reason: "payload layer must be innermost",
            });
        }
        if layers
            .iter()
            .skip(1)
            .any(|l| l.kind() == LayerKind::Sync)
        {
            return Err(DefinitionError::InvalidStack {
                reason: "sync layer must be outermost",
            });
        }
        Ok(Self { layers })
    }

    /// Start building a stack.
    #[must_use]
    pub fn builder() -> StackBuilder<M> {
        StackBuilder { layers: Vec::new() }
    }

    /// Layer roles, outermost first.
    pub fn layer_kinds(&self) -> impl Iterator<Item = LayerKind> + '_ {
        self.layers.iter().map(|l| l.kind())
    }

    /// Start-of-frame pattern of the outermost layer, if it is a sync layer.
    #[must_use]
    pub fn sync_pattern(&self) -> Option<&[u8]> {
        self.layers.first().and_then(|l| l.sync_pattern())
    }

    /// Encode a complete frame for `message`.
    pub fn encode(&self, message: &M) -> Result<Bytes> {
        let mut out = BytesMut::with_capacity(message.length() + 16);
        self.encode_into(message, &mut out)?;
        Ok(out.freeze())
    }

    /// Append a complete frame to `out`, returning its size. On failure
    /// nothing is left appended.
    pub fn encode_into(&self, message: &M, out: &mut BytesMut) -> Result<usize> {
        let start = out.len();
        match Next::new(&self.layers).encode(message, out) {
            Ok(()) => Ok(out.len() - start),
            Err(err) => {
                out.truncate(start);
                Err(err)
            }
        }
    }

    /// Decode one frame from the front of `input`.
    ///
    /// Returns the message and the number of bytes the frame occupied.
    pub fn decode(&self, input: &[u8]) -> Result<(M, usize)> {
        let mut ctx = DecodeContext::new(false);
        let consumed = Next::new(&self.layers).decode(input, &mut ctx)?;
        let message = ctx.take_message().ok_or(Error::MissingPayloadLayer)?;
        Ok((message, consumed))
    }

    /// Decode one frame and return its framing fields instead of the
    /// message.
    pub fn inspect(&self, frame: &[u8]) -> Result<TransportMessage> {
        let mut ctx = DecodeContext::new(true);
        Next::new(&self.layers).decode(frame, &mut ctx)?;
        Ok(TransportMessage::from_parts(
            ctx.recorded.take().unwrap_or_default(),
        ))
    }

    /// Default-initialized framing fields, in wire order.
    #[must_use]
    pub fn transport_message(&self) -> TransportMessage {
        let heads = self
            .layers
            .iter()
            .filter(|l| !l.is_trailer())
            .map(|l| (l.kind(), l.transport_field()));
        let tails = self
            .layers
            .iter()
            .rev()
            .filter(|l| l.is_trailer())
            .map(|l| (l.kind(), l.transport_field()));
        TransportMessage::from_parts(heads.chain(tails).collect())
    }

    /// First position at or after `from` where a frame could start.
    ///
    /// With a sync layer this is the next occurrence of the pattern, or of a
    /// pattern prefix running into the end of `buf`. Without one every
    /// position is a candidate.
    #[must_use]
    pub fn find_frame_start(&self, buf: &[u8], from: usize) -> usize {
        let Some(pattern) = self.sync_pattern() else {
            return from.min(buf.len());
        };
        (from..buf.len())
            .find(|&pos| {
                let tail = &buf[pos..];
                let n = tail.len().min(pattern.len());
                tail[..n] == pattern[..n]
            })
            .unwrap_or(buf.len())
    }
}

/// Incremental [`Stack`] construction.
pub struct StackBuilder<M> {
    layers: Vec<Box<dyn Layer<M>>>,
}

impl<M> fmt::Debug for StackBuilder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackBuilder")
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl<M: MessageSet> StackBuilder<M> {
    /// Append a layer inside the ones added so far.
    #[must_use]
    pub fn layer(mut self, layer: impl Layer<M> + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Validate and build.
    pub fn build(self) -> std::result::Result<Stack<M>, DefinitionError> {
        Stack::new(self.layers)
    }
}

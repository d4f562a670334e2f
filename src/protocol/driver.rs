//! Buffer-to-message driver

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, instrument, trace};

use super::{Error, Handler, MessageSet, NoopHandler, ReadStats, Result};
use crate::stack::Stack;

/// Configurable limits for a [`Protocol`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ProtocolConfig {
    /// Protocol name reported to tooling and in traces.
    pub name: String,
    /// Largest frame accepted on read or produced on write, in bytes.
    pub max_frame_len: usize,
    /// Stop a single `read` after this many messages.
    pub max_messages_per_read: Option<usize>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            name: String::from("fieldwire"),
            max_frame_len: 64 * 1024,
            max_messages_per_read: None,
        }
    }
}

/// Turns buffered bytes into dispatched messages and messages into frames.
///
/// `read` never fails: incomplete frames stay buffered until more bytes
/// arrive, and frames rejected by the stack or by message validation are
/// dropped by skipping to the next candidate frame start.
#[derive(Debug)]
pub struct Protocol<M, H = NoopHandler> {
    stack: Stack<M>,
    handler: H,
    config: ProtocolConfig,
    stats: ReadStats,
}

impl<M: MessageSet, H: Handler<M>> Protocol<M, H> {
    /// Driver with default limits.
    pub fn new(stack: Stack<M>, handler: H) -> Self {
        Self::with_config(stack, handler, ProtocolConfig::default())
    }

    /// Driver with explicit limits.
    pub fn with_config(stack: Stack<M>, handler: H, config: ProtocolConfig) -> Self {
        Self {
            stack,
            handler,
            config,
            stats: ReadStats::default(),
        }
    }

    /// Decode every complete frame at the front of `buffer`.
    ///
    /// Consumed and discarded bytes are split off `buffer`; a trailing
    /// partial frame is left in place. Each message is passed to the handler
    /// before being returned.
    #[instrument(
        level = "trace",
        skip_all,
        fields(protocol = %self.config.name, buffered = buffer.len())
    )]
    pub fn read(&mut self, buffer: &mut BytesMut) -> Vec<M> {
        let mut messages = Vec::new();
        while !buffer.is_empty() {
            if self
                .config
                .max_messages_per_read
                .is_some_and(|max| messages.len() >= max)
            {
                break;
            }

            match self.stack.decode(&buffer[..]) {
                Ok((_, 0)) => {
                    self.resync(buffer, &Error::invalid("frame consumed no input"));
                }
                Ok((mut message, consumed)) => {
                    if consumed > self.config.max_frame_len {
                        let err = Error::FrameTooLarge {
                            size: consumed,
                            max: self.config.max_frame_len,
                        };
                        self.resync(buffer, &err);
                        continue;
                    }
                    message.refresh();
                    if !message.valid() {
                        let err = Error::invalid(format!("{} failed validation", message.name()));
                        self.resync(buffer, &err);
                        continue;
                    }

                    buffer.advance(consumed);
                    self.stats.record_frame(consumed);
                    trace!(
                        id = message.id(),
                        name = message.name(),
                        len = consumed,
                        "frame decoded"
                    );
                    self.handler.handle(&message);
                    messages.push(message);
                }
                Err(err) if err.is_recoverable() && buffer.len() < self.config.max_frame_len => {
                    trace!(error = %err, "waiting for more data");
                    break;
                }
                Err(Error::NotEnoughData { .. }) => {
                    let err = Error::FrameTooLarge {
                        size: buffer.len(),
                        max: self.config.max_frame_len,
                    };
                    self.resync(buffer, &err);
                }
                Err(err) => self.resync(buffer, &err),
            }
        }
        messages
    }

    /// Refresh `message` and encode it as one complete frame.
    #[instrument(level = "trace", skip_all, fields(id = message.id()))]
    pub fn write(&self, message: &mut M) -> Result<Bytes> {
        message.refresh();
        let frame = self.stack.encode(message)?;
        if frame.len() > self.config.max_frame_len {
            return Err(Error::buffer_overflow(
                frame.len(),
                self.config.max_frame_len,
            ));
        }
        trace!(name = message.name(), len = frame.len(), "frame encoded");
        Ok(frame)
    }

    fn resync(&mut self, buffer: &mut BytesMut, err: &Error) {
        let skip = self.stack.find_frame_start(buffer, 1);
        buffer.advance(skip);
        self.stats.record_discard(err.status(), skip);
        debug!(error = %err, discarded = skip, "dropped frame start, resynchronizing");
    }
}

impl<M, H> Protocol<M, H> {
    /// Read counters.
    #[must_use]
    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }

    /// Mutable read counters, e.g. to reset them.
    pub fn stats_mut(&mut self) -> &mut ReadStats {
        &mut self.stats
    }

    /// Message handler.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Mutable message handler.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Consume the driver, returning its handler.
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Framing stack.
    #[must_use]
    pub fn stack(&self) -> &Stack<M> {
        &self.stack
    }

    /// Limits.
    #[must_use]
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Protocol name from the configuration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

//! fieldwire - composable binary wire-protocol codecs
//!
//! Messages are ordered lists of typed fields. Each field encodes and decodes
//! itself; a message walks its fields in declared order. Messages travel
//! inside framing stacks (sync pattern, id, length, checksum, payload) that
//! produce complete frames and recover from corrupted input.
//!
//! # Quick Start
//!
//! ```rust
//! use bytes::BytesMut;
//! use fieldwire::field::{AnyField, BlobField};
//! use fieldwire::protocol::{FieldMessage, Message, MessageSet, NoopHandler, Protocol};
//! use fieldwire::stack::{
//!     ChecksumKind, ChecksumLayer, IdLayer, LengthLayer, PayloadLayer, Stack, SyncLayer,
//! };
//!
//! #[derive(Debug)]
//! struct Raw(FieldMessage);
//!
//! impl Message for Raw {
//!     fn id(&self) -> u64 { self.0.id() }
//!     fn name(&self) -> &'static str { "Raw" }
//!     fn fields(&self) -> &[AnyField] { self.0.fields() }
//!     fn fields_mut(&mut self) -> &mut [AnyField] { self.0.fields_mut() }
//! }
//!
//! impl MessageSet for Raw {
//!     fn from_id(id: u64) -> Option<Self> {
//!         Some(Raw(FieldMessage::new(id, "Raw", [BlobField::variable().into()])))
//!     }
//! }
//!
//! // [SYNC] [ID] [LENGTH] [PAYLOAD] [CHECKSUM over ID..PAYLOAD]
//! let stack = Stack::builder()
//!     .layer(SyncLayer::new([0xAB])?)
//!     .layer(ChecksumLayer::new(ChecksumKind::Sum8))
//!     .layer(IdLayer::new(1)?)
//!     .layer(LengthLayer::new(2)?)
//!     .layer(PayloadLayer)
//!     .build()?;
//! let mut protocol = Protocol::new(stack, NoopHandler);
//!
//! let mut msg = Raw(FieldMessage::new(5, "Raw", [BlobField::variable().into()]));
//! if let Some(blob) = msg.0.field_mut(0).and_then(AnyField::as_blob_mut) {
//!     blob.set_value(vec![0x01, 0x02]);
//! }
//! let frame = protocol.write(&mut msg)?;
//! assert_eq!(frame.as_ref(), &[0xAB, 0x05, 0x00, 0x02, 0x01, 0x02, 0x0A]);
//!
//! let mut buffer = BytesMut::from(&frame[..]);
//! let messages = protocol.read(&mut buffer);
//! assert_eq!(messages.len(), 1);
//! assert!(buffer.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Features
//!
//! - **Definition-time options** - fixed length, defaults, validators, bit
//!   origin and byte order are resolved once when a field is built
//! - **Field adapters** - uniform numeric/byte view over any field
//! - **Tri-state decode** - short input is retried, corrupt input is skipped
//! - **Built-in checksums** - byte sums, CRC-16/32 and `XXHash3`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod adapter;
pub mod field;
pub mod protocol;
pub mod stack;
pub mod util;

pub use adapter::FieldAdapter;
pub use field::{AnyField, Field};
pub use protocol::{
    DefinitionError, Error, ErrorStatus, Handler, Message, MessageSet, Protocol, ProtocolConfig,
    Result, error, message,
};
pub use stack::{Layer, Stack};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

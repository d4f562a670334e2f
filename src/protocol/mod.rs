//! Messages and the protocol driver
//!
//! A [`Message`] is an ordered list of fields plus a type id. A
//! [`Protocol`] pairs a [`Stack`](crate::stack::Stack) with a [`Handler`]
//! and turns incoming bytes into dispatched messages.

mod driver;
pub mod error;
pub mod message;
mod stats;

pub use driver::{Protocol, ProtocolConfig};
pub use error::{DefinitionError, Error, ErrorStatus, Result};
pub use message::{FieldMessage, FnHandler, Handler, Message, MessageSet, NoopHandler, handler_fn};
pub use stats::ReadStats;

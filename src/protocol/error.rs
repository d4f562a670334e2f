//! Codec error types

use thiserror::Error;

/// Outcome category of an encode/decode operation.
///
/// Every [`Error`] maps onto exactly one non-success status; callers that
/// only care about the recovery policy can match on this instead of the
/// detailed error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorStatus {
    /// Operation completed.
    Success,
    /// Input ended before the value was complete. Retry with more bytes.
    NotEnoughData,
    /// Bytes were structurally readable but semantically rejected.
    InvalidMsgData,
    /// A framing layer contract was violated.
    ProtocolError,
    /// Output capacity was insufficient.
    BufferOverflow,
}

impl ErrorStatus {
    /// Status of a codec result.
    #[must_use]
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(err) => err.status(),
        }
    }
}

/// Codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input is shorter than the value being read
    #[error("not enough data: need {needed} bytes, got {available}")]
    NotEnoughData {
        /// Bytes required
        needed: usize,
        /// Bytes available
        available: usize,
    },

    /// Decoded value was rejected by a validator
    #[error("invalid message data: {reason}")]
    InvalidMsgData {
        /// Human readable rejection reason
        reason: String,
    },

    /// Frame does not start with the sync pattern
    #[error("sync pattern mismatch at offset {offset}")]
    SyncMismatch {
        /// Offset of the first mismatching byte within the pattern
        offset: usize,
    },

    /// Message id has no registered message
    #[error("unknown message id: {id:#x}")]
    UnknownMessageId {
        /// Id read from the wire
        id: u64,
    },

    /// Inner layers did not consume exactly the declared length
    #[error("length mismatch: declared {declared} bytes, inner layers used {actual}")]
    LengthMismatch {
        /// Length declared on the wire
        declared: usize,
        /// Bytes the inner layers consumed, or required when they ran short
        actual: usize,
    },

    /// Checksum mismatch
    #[error("checksum mismatch: expected {expected:#x}, got {found:#x}")]
    ChecksumMismatch {
        /// Checksum computed over the received bytes
        expected: u64,
        /// Checksum carried by the frame
        found: u64,
    },

    /// Declared frame length above the configured limit
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Declared size
        size: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Layer chain ended without a payload layer
    #[error("layer chain has no payload layer")]
    MissingPayloadLayer,

    /// Output capacity too small
    #[error("buffer overflow: need {needed} bytes, have {available}")]
    BufferOverflow {
        /// Bytes required
        needed: usize,
        /// Bytes available
        available: usize,
    },
}

impl Error {
    /// Shorthand for [`Error::NotEnoughData`].
    #[must_use]
    pub const fn not_enough_data(needed: usize, available: usize) -> Self {
        Self::NotEnoughData { needed, available }
    }

    /// Shorthand for [`Error::BufferOverflow`].
    #[must_use]
    pub const fn buffer_overflow(needed: usize, available: usize) -> Self {
        Self::BufferOverflow { needed, available }
    }

    /// Shorthand for [`Error::InvalidMsgData`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidMsgData {
            reason: reason.into(),
        }
    }

    /// Status category of this error.
    #[must_use]
    pub const fn status(&self) -> ErrorStatus {
        match self {
            Self::NotEnoughData { .. } => ErrorStatus::NotEnoughData,
            Self::InvalidMsgData { .. } => ErrorStatus::InvalidMsgData,
            Self::SyncMismatch { .. }
            | Self::UnknownMessageId { .. }
            | Self::LengthMismatch { .. }
            | Self::ChecksumMismatch { .. }
            | Self::FrameTooLarge { .. }
            | Self::MissingPayloadLayer => ErrorStatus::ProtocolError,
            Self::BufferOverflow { .. } => ErrorStatus::BufferOverflow,
        }
    }

    /// Whether retrying with more input can succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotEnoughData { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while defining fields, adapters and stacks.
///
/// These are contract violations of the definition itself and are reported
/// once, at construction, never during encode/decode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// The same option was supplied more than once
    #[error("option `{option}` supplied more than once")]
    DuplicateOption {
        /// Option name
        option: &'static str,
    },

    /// Fixed length outside the range supported by the field kind
    #[error("fixed length {len} outside supported range {min}..={max}")]
    InvalidLength {
        /// Requested length
        len: usize,
        /// Smallest allowed length
        min: usize,
        /// Largest allowed length
        max: usize,
    },

    /// Default value does not fit the serialized width
    #[error("default value does not fit in {bits} bits")]
    DefaultOutOfRange {
        /// Serialized bit width
        bits: usize,
    },

    /// Bitfield members do not fit the serialized width
    #[error("bitfield members need {bits} bits, serialized width is {available}")]
    BitfieldOverflow {
        /// Total member bits
        bits: usize,
        /// Serialized bit width
        available: usize,
    },

    /// Bitfield member declared with zero bits
    #[error("bitfield member {index} has zero width")]
    EmptyMember {
        /// Member index
        index: usize,
    },

    /// Field is wider than the adapter representation
    #[error("field is {bits} bits wide, adapter holds at most {max}")]
    AdapterTooNarrow {
        /// Field bit width
        bits: usize,
        /// Adapter representation width
        max: usize,
    },

    /// Stack layers are not in a usable order
    #[error("invalid stack layout: {reason}")]
    InvalidStack {
        /// What is wrong with the layout
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::not_enough_data(4, 2).status(),
            ErrorStatus::NotEnoughData
        );
        assert_eq!(Error::invalid("bad").status(), ErrorStatus::InvalidMsgData);
        assert_eq!(
            Error::ChecksumMismatch {
                expected: 1,
                found: 2
            }
            .status(),
            ErrorStatus::ProtocolError
        );
        assert_eq!(
            Error::buffer_overflow(8, 4).status(),
            ErrorStatus::BufferOverflow
        );
    }

    #[test]
    fn test_only_short_input_is_recoverable() {
        assert!(Error::not_enough_data(1, 0).is_recoverable());
        assert!(!Error::MissingPayloadLayer.is_recoverable());
        assert!(!Error::UnknownMessageId { id: 9 }.is_recoverable());
    }

    #[test]
    fn test_status_of_result() {
        let ok: Result<()> = Ok(());
        let err: Result<()> = Err(Error::SyncMismatch { offset: 0 });
        assert_eq!(ErrorStatus::of(&ok), ErrorStatus::Success);
        assert_eq!(ErrorStatus::of(&err), ErrorStatus::ProtocolError);
    }
}

//! Opaque byte blob fields

use bytes::{BufMut, BytesMut};

use super::{Field, FieldKind, FieldOptions, LengthPolicy, Validator};
use crate::protocol::{DefinitionError, Error, Result};

/// Raw bytes with either a fixed or a value-dependent length.
///
/// A variable-length blob consumes the whole input window on read, so it
/// belongs at the end of a message or inside a length-bounded layer.
#[derive(Debug, Clone)]
pub struct BlobField {
    policy: LengthPolicy,
    data: Vec<u8>,
    validator: Option<Validator<Vec<u8>>>,
}

impl BlobField {
    /// Build a field from resolved options.
    pub fn new(options: FieldOptions<Vec<u8>>) -> std::result::Result<Self, DefinitionError> {
        options.check()?;
        let policy = match options.fixed_len() {
            Some(0) => {
                return Err(DefinitionError::InvalidLength {
                    len: 0,
                    min: 1,
                    max: usize::MAX,
                });
            }
            Some(len) => LengthPolicy::Fixed(len),
            None => LengthPolicy::Variable,
        };
        let (default_value, validator) = options.into_parts();
        let data = match (default_value, policy) {
            (Some(data), LengthPolicy::Fixed(len)) if data.len() != len => {
                return Err(DefinitionError::DefaultOutOfRange { bits: len * 8 });
            }
            (Some(data), _) => data,
            (None, LengthPolicy::Fixed(len)) => vec![0; len],
            (None, LengthPolicy::Variable) => Vec::new(),
        };

        Ok(Self {
            policy,
            data,
            validator,
        })
    }

    /// Empty variable-length blob.
    #[must_use]
    pub fn variable() -> Self {
        Self {
            policy: LengthPolicy::Variable,
            data: Vec::new(),
            validator: None,
        }
    }

    /// Zero-filled blob of exactly `len` bytes; `len` must be non-zero.
    pub fn fixed(len: usize) -> std::result::Result<Self, DefinitionError> {
        Self::new(FieldOptions::new().fixed_length(len))
    }

    /// Length policy.
    #[must_use]
    pub const fn policy(&self) -> LengthPolicy {
        self.policy
    }

    /// Current bytes.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.data
    }

    /// Replace the bytes. A fixed-length blob is resized by
    /// [`Field::refresh`]; until then `write` pads or truncates.
    pub fn set_value(&mut self, data: impl Into<Vec<u8>>) {
        self.data = data.into();
    }

    fn accepts(&self, data: &Vec<u8>) -> bool {
        self.validator.as_ref().is_none_or(|v| v.check(data))
    }
}

impl Field for BlobField {
    fn kind(&self) -> FieldKind {
        FieldKind::Blob
    }

    fn length(&self) -> usize {
        match self.policy {
            LengthPolicy::Fixed(len) => len,
            LengthPolicy::Variable => self.data.len(),
        }
    }

    fn read(&mut self, input: &mut &[u8]) -> Result<()> {
        let take = match self.policy {
            LengthPolicy::Fixed(len) if input.len() < len => {
                return Err(Error::not_enough_data(len, input.len()));
            }
            LengthPolicy::Fixed(len) => len,
            LengthPolicy::Variable => input.len(),
        };
        let (head, rest) = input.split_at(take);
        let data = head.to_vec();
        if !self.accepts(&data) {
            return Err(Error::invalid(format!("{take}-byte blob rejected")));
        }
        self.data = data;
        *input = rest;
        Ok(())
    }

    fn write(&self, out: &mut BytesMut, max_len: usize) -> Result<()> {
        let len = self.length();
        if max_len < len {
            return Err(Error::buffer_overflow(len, max_len));
        }
        let copied = self.data.len().min(len);
        out.put_slice(&self.data[..copied]);
        out.put_bytes(0, len - copied);
        Ok(())
    }

    fn valid(&self) -> bool {
        !self.pending_refresh() && self.accepts(&self.data)
    }

    fn refresh(&mut self) -> bool {
        match self.policy {
            LengthPolicy::Fixed(len) if self.data.len() != len => {
                self.data.resize(len, 0);
                true
            }
            _ => false,
        }
    }

    fn pending_refresh(&self) -> bool {
        matches!(self.policy, LengthPolicy::Fixed(len) if self.data.len() != len)
    }
}

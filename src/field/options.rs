//! Definition-time field configuration

use std::fmt;
use std::sync::Arc;

use crate::protocol::DefinitionError;

/// Which end of the serialized width bit index 0 refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitOrigin {
    /// Bit 0 is the least significant bit.
    #[default]
    Lsb,
    /// Bit 0 is the most significant bit of the serialized width.
    Msb,
}

/// Byte order of multi-byte values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endian {
    /// Most significant byte first.
    #[default]
    Big,
    /// Least significant byte first.
    Little,
}

/// How many bytes a field occupies on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthPolicy {
    /// Always exactly this many bytes.
    Fixed(usize),
    /// Depends on the current value.
    Variable,
}

/// Custom validity predicate.
pub struct Validator<T>(Arc<dyn Fn(&T) -> bool + Send + Sync>);

impl<T> Validator<T> {
    /// Wrap a predicate.
    pub fn new(pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(pred))
    }

    /// Evaluate the predicate.
    #[must_use]
    pub fn check(&self, value: &T) -> bool {
        (self.0)(value)
    }
}

impl<T> Clone for Validator<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Validator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// A single field option.
#[derive(Debug, Clone)]
pub enum FieldOption<T> {
    /// Serialize in exactly this many bytes.
    FixedLength(usize),
    /// Initial value of a freshly constructed field.
    DefaultValue(T),
    /// Extra validity predicate.
    Validator(Validator<T>),
    /// Bit index origin for bit-packed fields.
    BitOrigin(BitOrigin),
    /// Byte order for multi-byte values.
    Endian(Endian),
}

impl<T> FieldOption<T> {
    const fn name(&self) -> &'static str {
        match self {
            Self::FixedLength(_) => "fixed_length",
            Self::DefaultValue(_) => "default_value",
            Self::Validator(_) => "validator",
            Self::BitOrigin(_) => "bit_origin",
            Self::Endian(_) => "endian",
        }
    }
}

/// Resolved option record handed to a field constructor.
///
/// Each option occupies its own slot, so the order options are supplied in
/// never changes the result. An empty record yields the baseline field:
/// natural width, no validator, LSB-first, big-endian.
///
/// The builder methods never fail on their own; an option supplied twice is
/// remembered and reported by [`FieldOptions::check`], which every field
/// constructor calls first.
#[derive(Debug, Clone)]
pub struct FieldOptions<T> {
    fixed_length: Option<usize>,
    default_value: Option<T>,
    validator: Option<Validator<T>>,
    bit_origin: Option<BitOrigin>,
    endian: Option<Endian>,
    duplicate: Option<&'static str>,
}

impl<T> Default for FieldOptions<T> {
    fn default() -> Self {
        Self {
            fixed_length: None,
            default_value: None,
            validator: None,
            bit_origin: None,
            endian: None,
            duplicate: None,
        }
    }
}

impl<T> FieldOptions<T> {
    /// Baseline options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a list of options, rejecting any option given twice.
    pub fn resolve<I>(options: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = FieldOption<T>>,
    {
        let mut resolved = Self::default();
        for option in options {
            resolved.apply(option)?;
        }
        Ok(resolved)
    }

    fn apply(&mut self, option: FieldOption<T>) -> Result<(), DefinitionError> {
        let name = option.name();
        let occupied = match option {
            FieldOption::FixedLength(len) => fill(&mut self.fixed_length, len),
            FieldOption::DefaultValue(value) => fill(&mut self.default_value, value),
            FieldOption::Validator(pred) => fill(&mut self.validator, pred),
            FieldOption::BitOrigin(origin) => fill(&mut self.bit_origin, origin),
            FieldOption::Endian(endian) => fill(&mut self.endian, endian),
        };
        if occupied {
            return Err(DefinitionError::DuplicateOption { option: name });
        }
        Ok(())
    }

    fn push(mut self, option: FieldOption<T>) -> Self {
        if let Err(DefinitionError::DuplicateOption { option }) = self.apply(option) {
            self.duplicate.get_or_insert(option);
        }
        self
    }

    /// Set the fixed serialized length.
    #[must_use]
    pub fn fixed_length(self, len: usize) -> Self {
        self.push(FieldOption::FixedLength(len))
    }

    /// Set the default value.
    #[must_use]
    pub fn default_value(self, value: T) -> Self {
        self.push(FieldOption::DefaultValue(value))
    }

    /// Set the validity predicate.
    #[must_use]
    pub fn validator(self, pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.push(FieldOption::Validator(Validator::new(pred)))
    }

    /// Count bits from the most significant end.
    #[must_use]
    pub fn msb_first(self) -> Self {
        self.push(FieldOption::BitOrigin(BitOrigin::Msb))
    }

    /// Set the byte order.
    #[must_use]
    pub fn endian(self, endian: Endian) -> Self {
        self.push(FieldOption::Endian(endian))
    }

    /// Fails if any option was supplied more than once.
    pub fn check(&self) -> Result<(), DefinitionError> {
        match self.duplicate {
            Some(option) => Err(DefinitionError::DuplicateOption { option }),
            None => Ok(()),
        }
    }

    /// Configured fixed length, if any.
    #[must_use]
    pub fn fixed_len(&self) -> Option<usize> {
        self.fixed_length
    }

    /// Configured bit origin.
    #[must_use]
    pub fn bit_origin(&self) -> BitOrigin {
        self.bit_origin.unwrap_or_default()
    }

    /// Configured byte order.
    #[must_use]
    pub fn byte_order(&self) -> Endian {
        self.endian.unwrap_or_default()
    }

    pub(crate) fn into_parts(self) -> (Option<T>, Option<Validator<T>>) {
        (self.default_value, self.validator)
    }
}

/// Stores `value` unless the slot is taken; returns whether it was taken.
fn fill<V>(slot: &mut Option<V>, value: V) -> bool {
    if slot.is_some() {
        return true;
    }
    *slot = Some(value);
    false
}

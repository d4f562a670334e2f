//! Byte-only adapter

use super::{AdapterKind, FieldAdapter, deserialise, serialise};
use crate::field::Field;

/// View over a field with no numeric representation (blobs, integers wider
/// than the adapter width). Only the serialized bytes are accessible.
#[derive(Debug)]
pub struct UnknownValueAdapter<'a, F> {
    field: &'a mut F,
}

impl<'a, F: Field + Clone> UnknownValueAdapter<'a, F> {
    /// Wrap any field.
    pub fn new(field: &'a mut F) -> Self {
        Self { field }
    }
}

impl<F: Field + Clone> FieldAdapter for UnknownValueAdapter<'_, F> {
    fn kind(&self) -> AdapterKind {
        AdapterKind::UnknownValue
    }

    fn value(&self) -> Option<u64> {
        None
    }

    fn set_value(&mut self, _value: u64) -> bool {
        false
    }

    fn serialised_value(&self) -> Vec<u8> {
        serialise(&*self.field)
    }

    fn set_serialised_value(&mut self, bytes: &[u8]) -> bool {
        deserialise(&mut *self.field, bytes)
    }

    fn valid(&self) -> bool {
        self.field.valid()
    }

    fn length(&self) -> usize {
        self.field.length()
    }

    fn refresh(&mut self) -> bool {
        self.field.refresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::BlobField;

    #[test]
    fn test_blob_bytes_only() {
        let mut field = BlobField::variable();
        let mut adapter = UnknownValueAdapter::new(&mut field);
        assert_eq!(adapter.value(), None);
        assert!(!adapter.set_value(3));
        assert!(adapter.set_serialised_value(b"abc"));
        assert_eq!(adapter.serialised_value(), b"abc".to_vec());
        assert_eq!(adapter.length(), 3);
        assert_eq!(field.value(), b"abc");
    }

    #[test]
    fn test_fixed_blob_short_bytes_rejected() {
        let mut field = BlobField::fixed(4).unwrap();
        let mut adapter = UnknownValueAdapter::new(&mut field);
        assert!(!adapter.set_serialised_value(&[1, 2]));
        assert_eq!(adapter.serialised_value(), vec![0, 0, 0, 0]);
    }
}

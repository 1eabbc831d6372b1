//! Pass 2: Key indexing -- build the key -> position index and reject
//! duplicate keys. This is the only fatal check in the pipeline.

use crate::error::ConvertError;
use crate::pass1_rows::StagedField;
use std::collections::HashMap;

/// Key index over the staged field list.
#[derive(Debug, Clone, Default)]
pub struct Index {
    positions: HashMap<String, usize>,
    rows: HashMap<String, u32>,
}

impl Index {
    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn row_of(&self, key: &str) -> Option<u32> {
        self.rows.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Register a key added after intake (a synthesized group parent).
    pub(crate) fn insert(&mut self, key: &str, position: usize) -> Result<(), ConvertError> {
        if self.positions.contains_key(key) {
            return Err(ConvertError::new(
                3,
                Some(key),
                self.row_of(key),
                format!("group parent '{}' duplicates an existing field key", key),
            ));
        }
        self.positions.insert(key.to_owned(), position);
        Ok(())
    }
}

pub fn build_index(fields: &[StagedField]) -> Result<Index, ConvertError> {
    let mut idx = Index::default();
    for (pos, staged) in fields.iter().enumerate() {
        let key = &staged.field.key;
        if let Some(first) = idx.rows.get(key) {
            return Err(ConvertError::duplicate_key(key, *first, staged.row));
        }
        idx.positions.insert(key.clone(), pos);
        idx.rows.insert(key.clone(), staged.row);
    }
    Ok(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, FieldStyle};

    fn staged(key: &str, row: u32) -> StagedField {
        StagedField {
            field: Field::new(key, key, FieldStyle::Field),
            row,
        }
    }

    #[test]
    fn indexes_unique_keys() {
        let idx = build_index(&[staged("A", 2), staged("B", 3)]).unwrap();
        assert_eq!(idx.position("B"), Some(1));
        assert_eq!(idx.row_of("A"), Some(2));
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn duplicate_key_is_fatal() {
        let err = build_index(&[staged("A", 2), staged("B", 3), staged("A", 7)]).unwrap_err();
        assert_eq!(err.pass, 2);
        assert_eq!(err.field_key.as_deref(), Some("A"));
        assert_eq!(err.row, Some(7));
        assert!(err.message.contains("row 2"));
    }

    #[test]
    fn keys_are_case_sensitive() {
        assert!(build_index(&[staged("a", 2), staged("A", 3)]).is_ok());
    }
}

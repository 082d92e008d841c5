//! Header fields and the per-message header table.
//!
//! # Design Decisions
//! - Names compare ASCII case-insensitively; the table keeps the spelling of
//!   the first occurrence
//! - A repeated name is combined destructively: the existing value grows by
//!   `", "` plus the new value, the existing field is flagged
//!   [`FieldFlags::REPEATED`] and the new field is dropped
//! - Backed by an `IndexMap` so display order follows the wire

use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};

use crate::http::flags::FieldFlags;
use crate::http::serialize_lossy;

/// One logical header field, owning its name and value bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct HeaderField {
    #[serde(serialize_with = "serialize_lossy")]
    pub name: Vec<u8>,
    #[serde(serialize_with = "serialize_lossy")]
    pub value: Vec<u8>,
    pub flags: FieldFlags,
}

impl HeaderField {
    pub fn new(name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            flags: FieldFlags::empty(),
        }
    }

    /// Value as text, replacing invalid UTF-8.
    pub fn value_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }
}

/// What happened to a field handed to [`HeaderTable::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    /// Stored as a new entry at this index.
    Inserted(usize),
    /// Combined into the existing entry at this index.
    Combined(usize),
}

impl Merge {
    /// Index of the table entry now holding the field's value.
    pub fn index(self) -> usize {
        match self {
            Merge::Inserted(index) | Merge::Combined(index) => index,
        }
    }
}

/// Name to header mapping for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTable {
    fields: IndexMap<Vec<u8>, HeaderField>,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `field`, combining it with an existing field of the same name.
    pub fn insert(&mut self, field: HeaderField) -> Merge {
        let key = field.name.to_ascii_lowercase();
        match self.fields.get_full_mut(&key) {
            Some((index, _, existing)) => {
                existing.value.reserve(2 + field.value.len());
                existing.value.extend_from_slice(b", ");
                existing.value.extend_from_slice(&field.value);
                existing.flags |= FieldFlags::REPEATED;
                Merge::Combined(index)
            }
            None => {
                let (index, _) = self.fields.insert_full(key, field);
                Merge::Inserted(index)
            }
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&HeaderField> {
        self.fields.get(&name.as_ref().to_ascii_lowercase())
    }

    pub fn get_index(&self, index: usize) -> Option<&HeaderField> {
        self.fields.get_index(index).map(|(_, field)| field)
    }

    pub fn contains(&self, name: impl AsRef<[u8]>) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderField> {
        self.fields.values()
    }
}

impl Serialize for HeaderTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.fields.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_new_field() {
        let mut table = HeaderTable::new();
        let merge = table.insert(HeaderField::new("Server", "nginx"));

        assert_eq!(merge, Merge::Inserted(0));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("server").unwrap().value, b"nginx");
        assert!(table.get("Server").unwrap().flags.is_empty());
    }

    #[test]
    fn test_repeated_field_is_combined() {
        let mut table = HeaderTable::new();
        table.insert(HeaderField::new("X-Test", "a"));
        let merge = table.insert(HeaderField::new("x-test", "b"));

        assert_eq!(merge, Merge::Combined(0));
        assert_eq!(table.len(), 1);

        let field = table.get("X-TEST").unwrap();
        assert_eq!(field.name, b"X-Test");
        assert_eq!(field.value, b"a, b");
        assert!(field.flags.contains(FieldFlags::REPEATED));
    }

    #[test]
    fn test_combine_keeps_existing_flags() {
        let mut table = HeaderTable::new();
        let mut first = HeaderField::new("A", "1");
        first.flags |= FieldFlags::FOLDED;
        table.insert(first);

        let mut second = HeaderField::new("A", "");
        second.flags |= FieldFlags::INVALID;
        table.insert(second);

        let field = table.get("a").unwrap();
        assert_eq!(field.value, b"1, ");
        assert_eq!(field.flags, FieldFlags::FOLDED | FieldFlags::REPEATED);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut table = HeaderTable::new();
        table.insert(HeaderField::new("B", "1"));
        table.insert(HeaderField::new("A", "2"));
        table.insert(HeaderField::new("b", "3"));

        let names: Vec<_> = table.iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec![b"B".to_vec(), b"A".to_vec()]);
        assert_eq!(table.get_index(1).unwrap().value, b"2");
    }
}

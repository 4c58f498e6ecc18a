//! Store XML element attributes and their values.

use itertools::Itertools;
use std::fmt;
use std::slice;
use string_cache::DefaultAtom;

use crate::names::{Name, NameCode};

/// Type used to store attribute values.
///
/// Attribute values are often repeated in an SVG file, so we intern them using the
/// string_cache crate.
pub type AttributeValue = DefaultAtom;

/// One attribute of an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeRecord {
    pub key: Name,
    pub value: AttributeValue,
}

/// Attributes of an element, with unique keys.
///
/// Iteration order is the order in which keys were first set.  Replacing the value of an
/// existing key keeps its position; removing a key and setting it again moves it to the
/// end.
#[derive(Clone, Default, PartialEq)]
pub struct Attributes {
    attrs: Vec<AttributeRecord>,
}

/// Iterator from `Attributes.iter`.
pub struct AttributesIter<'a>(slice::Iter<'a, AttributeRecord>);

impl Attributes {
    pub fn new() -> Attributes {
        Attributes::default()
    }

    /// Returns the number of attributes.
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn get(&self, key: NameCode) -> Option<&AttributeValue> {
        self.attrs
            .iter()
            .find(|r| r.key.code() == key)
            .map(|r| &r.value)
    }

    /// Sets `key` to `value` and returns the previous value, if any.
    pub fn set(&mut self, key: Name, value: AttributeValue) -> Option<AttributeValue> {
        match self.attrs.iter_mut().find(|r| r.key.code() == key.code()) {
            Some(record) => Some(std::mem::replace(&mut record.value, value)),
            None => {
                self.attrs.push(AttributeRecord { key, value });
                None
            }
        }
    }

    /// Removes `key` and returns its value, if it was present.
    pub fn remove(&mut self, key: NameCode) -> Option<AttributeValue> {
        self.attrs
            .iter()
            .position(|r| r.key.code() == key)
            .map(|idx| self.attrs.remove(idx).value)
    }

    /// Whether any attribute name contains `partial` as a substring.
    ///
    /// This is a plain substring search, so `"id"` matches both `"identity"` and
    /// `"hidden"`.
    pub fn contains_name_substring(&self, partial: &str) -> bool {
        self.attrs.iter().any(|r| r.key.as_str().contains(partial))
    }

    /// Creates an iterator that yields `(&Name, &str)` tuples.
    pub fn iter(&self) -> AttributesIter<'_> {
        AttributesIter(self.attrs.iter())
    }

    pub fn to_vec(&self) -> Vec<AttributeRecord> {
        self.attrs.clone()
    }
}

impl<'a> Iterator for AttributesIter<'a> {
    type Item = (&'a Name, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|r| (&r.key, r.value.as_ref()))
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.iter()
                .map(|(k, v)| format!("{}={:?}", k, v))
                .join(", ")
        )
    }
}

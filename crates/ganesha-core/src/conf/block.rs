//! Typed block tree for Ganesha configuration documents
//!
//! A document is a list of [`Block`]s. Each block has a name, an ordered set
//! of attributes and an ordered list of child blocks. `%url` directives are
//! blocks too, named `%url` with a single `value` attribute.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Block name used for `%url` directives
pub const URL_BLOCK_NAME: &str = "%url";

/// Attribute holding the target of a `%url` directive
pub const URL_VALUE_KEY: &str = "value";

/// Attribute holding an export's identifier
pub const EXPORT_ID_KEY: &str = "export_id";

/// An attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// `true` / `false`
    Bool(bool),
    /// Bare numeral
    Int(i64),
    /// Quoted string or bare token
    Str(String),
    /// Comma separated values
    List(Vec<Value>),
}

impl Value {
    /// Zero, `false`, empty string and empty list are falsy and never written
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Str(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Insertion-ordered attribute map
///
/// Keys are unique. Inserting an existing key replaces its value in place, so
/// the key keeps its original position. Equality ignores order.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: Vec<(String, Value)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// String value of `key`, if present and a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace; returns the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Order-insensitive equality that skips `ignored` on both sides
    pub fn eq_ignoring(&self, other: &Attributes, ignored: &str) -> bool {
        let ours = self.iter().filter(|(k, _)| *k != ignored);
        let theirs = other.iter().filter(|(k, _)| *k != ignored).count();
        let mut count = 0;
        for (key, value) in ours {
            if other.get(key) != Some(value) {
                return false;
            }
            count += 1;
        }
        count == theirs
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for Attributes {}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.insert(k, v);
        }
        attrs
    }
}

impl IntoIterator for Attributes {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AttributesVisitor;

        impl<'de> Visitor<'de> for AttributesVisitor {
            type Value = Attributes;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of attribute names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Attributes, A::Error> {
                let mut attrs = Attributes::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    attrs.insert(key, value);
                }
                Ok(attrs)
            }
        }

        deserializer.deserialize_map(AttributesVisitor)
    }
}

/// Classification of a block by its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Export,
    Fsal,
    Client,
    Url,
    Other,
}

impl BlockKind {
    pub fn of(name: &str) -> Self {
        match name {
            "EXPORT" => BlockKind::Export,
            "FSAL" => BlockKind::Fsal,
            "CLIENT" => BlockKind::Client,
            URL_BLOCK_NAME => BlockKind::Url,
            _ => BlockKind::Other,
        }
    }

    /// Canonical block name, `None` for [`BlockKind::Other`]
    pub fn name(self) -> Option<&'static str> {
        match self {
            BlockKind::Export => Some("EXPORT"),
            BlockKind::Fsal => Some("FSAL"),
            BlockKind::Client => Some("CLIENT"),
            BlockKind::Url => Some(URL_BLOCK_NAME),
            BlockKind::Other => None,
        }
    }
}

/// A configuration block
///
/// Equality compares attributes as a map and children in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    pub attributes: Attributes,
    pub children: Vec<Block>,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// A `%url` directive pointing at `target`
    pub fn url(target: impl Into<String>) -> Self {
        let target: String = target.into();
        Self::new(URL_BLOCK_NAME).with_attr(URL_VALUE_KEY, target)
    }

    /// Builder: add or replace an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// Builder: append a child block
    pub fn with_child(mut self, child: Block) -> Self {
        self.children.push(child);
        self
    }

    pub fn kind(&self) -> BlockKind {
        BlockKind::of(&self.name)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Target of a `%url` directive
    pub fn url_target(&self) -> Option<&str> {
        match self.kind() {
            BlockKind::Url => self.attributes.get_str(URL_VALUE_KEY),
            _ => None,
        }
    }

    pub fn export_id(&self) -> Option<i64> {
        self.get(EXPORT_ID_KEY).and_then(Value::as_int)
    }

    /// First FSAL child
    pub fn fsal(&self) -> Option<&Block> {
        self.children_of(BlockKind::Fsal).next()
    }

    pub fn clients(&self) -> impl Iterator<Item = &Block> {
        self.children_of(BlockKind::Client)
    }

    pub fn children_of(&self, kind: BlockKind) -> impl Iterator<Item = &Block> {
        self.children.iter().filter(move |b| b.kind() == kind)
    }

    /// Structural equality ignoring the top-level `export_id`
    pub fn same_export_as(&self, other: &Block) -> bool {
        self.name == other.name
            && self.children == other.children
            && self.attributes.eq_ignoring(&other.attributes, EXPORT_ID_KEY)
    }
}

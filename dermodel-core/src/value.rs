//! Structured values produced by decoding and consumed by encoding

use crate::datatypes::{BitString, ObjectIdentifier, Timestamp};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded (or to-be-encoded) ASN.1 value
///
/// The shape mirrors the schema node that produced it: composites become
/// [`Value::Map`], repetitions [`Value::Seq`], choices [`Value::Choice`].
/// Leaves use the most natural Rust representation of their content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(BigInt),
    Real(f64),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
    BitString(BitString),
    /// Text of any string type, object descriptor, or a symbolic label
    Str(String),
    Oid(ObjectIdentifier),
    Time(Timestamp),
    Seq(Vec<Value>),
    Map(Fields),
    /// Selected alternative label and its value
    Choice(String, Box<Value>),
}

impl Value {
    pub fn choice(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Value::Choice(label.into(), Box::new(value.into()))
    }

    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Real(_) => "real",
            Value::Bytes(_) => "bytes",
            Value::BitString(_) => "bitstring",
            Value::Str(_) => "string",
            Value::Oid(_) => "oid",
            Value::Time(_) => "time",
            Value::Seq(_) => "seq",
            Value::Map(_) => "map",
            Value::Choice(_, _) => "choice",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    /// Field lookup on a [`Value::Map`]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Textual key used to match this value against `switch` cases and label tables
    ///
    /// Strings map to themselves, integers to decimal, booleans to
    /// `true`/`false`, object identifiers to dotted form. Other values have
    /// no key.
    pub fn key_string(&self) -> Option<String> {
        match self {
            Value::Str(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Oid(oid) => Some(oid.to_dotted()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Bytes(bytes) => {
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::BitString(bits) => write!(f, "'{}'B", bits),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Oid(oid) => write!(f, "{}", oid),
            Value::Time(ts) => write!(f, "{}", ts),
            Value::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(fields) => write!(f, "{}", fields),
            Value::Choice(label, value) => write!(f, "{}: {}", label, value),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(BigInt::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(BigInt::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Int(BigInt::from(value))
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<BitString> for Value {
    fn from(value: BitString) -> Self {
        Value::BitString(value)
    }
}

impl From<ObjectIdentifier> for Value {
    fn from(value: ObjectIdentifier) -> Self {
        Value::Oid(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::Time(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Seq(value)
    }
}

impl From<Fields> for Value {
    fn from(value: Fields) -> Self {
        Value::Map(value)
    }
}

/// Ordered key/value content of a SEQUENCE or SET
///
/// Keys keep insertion order, which for decoded values is schema
/// declaration order. Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (key, value) in iter {
            fields.insert(key, value);
        }
        fields
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_keep_insertion_order() {
        let mut fields = Fields::new();
        fields.insert("b", 1i64);
        fields.insert("a", true);
        fields.insert("b", 2i64);
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(fields.get("b"), Some(&Value::from(2i64)));
        assert_eq!(fields.remove("a"), Some(Value::Bool(true)));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_key_string() {
        assert_eq!(Value::from("12").key_string().as_deref(), Some("12"));
        assert_eq!(Value::from(-15i64).key_string().as_deref(), Some("-15"));
        assert_eq!(Value::Null.key_string(), None);
    }

    #[test]
    fn test_display() {
        let value: Value = Fields::from_iter([
            ("id", Value::from(1i64)),
            ("data", Value::choice("raw", vec![0xABu8, 0x01])),
        ])
        .into();
        assert_eq!(value.to_string(), "{id: 1, data: raw: ab01}");
    }

    #[test]
    fn test_value_serializes_to_json() {
        let value = Value::Map(Fields::from_iter([("flag", true)]));
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}

//! A small tagged value type for the dynamic `details`/`data` maps attached
//! to audit entries and transactions, with a canonical, hash-stable
//! encoding.
//!
//! Keys are always held in a [`BTreeMap`] so iteration order is
//! lexicographic by construction; [`Value::canonical_bytes`] renders each
//! variant with a fixed tag prefix so no two distinct values can ever
//! collide on their encoded bytes.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A dynamic, canonically-hashable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Text(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

/// An ordered map of dynamic values, always serialized with sorted keys.
pub type Details = BTreeMap<String, Value>;

impl Value {
    /// Renders a deterministic byte encoding used as hash input.
    ///
    /// Each variant is prefixed with a single tag byte so, for example,
    /// `Value::Text("1")` and `Value::Int(1)` never produce the same bytes.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        match self {
            Value::Null => vec![b'n'],
            Value::Bool(b) => vec![b'b', if *b { 1 } else { 0 }],
            Value::Int(i) => {
                let mut out = vec![b'i'];
                out.extend_from_slice(i.to_string().as_bytes());
                out
            }
            Value::Decimal(d) => {
                let mut out = vec![b'd'];
                out.extend_from_slice(d.normalize().to_string().as_bytes());
                out
            }
            Value::Text(s) => {
                let mut out = vec![b't'];
                out.extend_from_slice(s.as_bytes());
                out
            }
            Value::Array(items) => {
                let mut out = vec![b'a'];
                for item in items {
                    out.extend_from_slice(&item.canonical_bytes());
                    out.push(0x1f);
                }
                out
            }
            Value::Object(map) => {
                let mut out = vec![b'o'];
                for (k, v) in map {
                    out.extend_from_slice(k.as_bytes());
                    out.push(0x1e);
                    out.extend_from_slice(&v.canonical_bytes());
                    out.push(0x1f);
                }
                out
            }
        }
    }
}

/// Renders a [`Details`] map to canonical bytes (sorted keys, tagged values).
pub fn canonical_details_bytes(details: &Details) -> Vec<u8> {
    let mut out = Vec::new();
    for (k, v) in details {
        out.extend_from_slice(k.as_bytes());
        out.push(0x1e);
        out.extend_from_slice(&v.canonical_bytes());
        out.push(0x1f);
    }
    out
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

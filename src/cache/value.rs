//! Cache Value Module
//!
//! Defines the opaque payload type stored by the cache and its size estimator.

use serde::{Deserialize, Serialize};

// == Cache Value ==
/// An opaque cache payload.
///
/// The cache never inspects a value beyond the size estimate used for memory
/// accounting. The variants cover the payload classes the estimator
/// distinguishes; everything else should be serialized by the caller and
/// stored as `Bytes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean payload
    Bool(bool),
    /// Signed integer payload
    Int(i64),
    /// Floating-point payload
    Float(f64),
    /// UTF-8 string payload
    Str(String),
    /// Raw byte payload
    Bytes(Vec<u8>),
}

impl Value {
    // == Estimated Size ==
    /// Returns the estimated heap contribution of this value in bytes.
    ///
    /// Exact length for strings and byte buffers, 8 for numbers, 1 for
    /// booleans. Deterministic and infallible; the result is the accounting
    /// unit for the memory budget, not a measured footprint.
    pub fn estimated_size(&self) -> i64 {
        match self {
            Value::Str(s) => s.len() as i64,
            Value::Bytes(b) => b.len() as i64,
            Value::Int(_) => 8,
            Value::Float(_) => 8,
            Value::Bool(_) => 1,
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

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

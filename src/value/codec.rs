//! Value codec
//!
//! Converts typed values to (payload, flags) pairs and back.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{MemwireError, Result};

use super::flags::{Kind, FLAG_BOOLEAN, FLAG_FLOAT, FLAG_INTEGER, FLAG_SERIALIZED, FLAG_STRING};

/// A value as seen by the caller.
///
/// The variant is the type tag: it decides the flags word on the wire and
/// is restored from that flags word on retrieval.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Raw bytes (usually UTF-8 text), stored unmodified
    String(Bytes),

    /// 64-bit signed integer, stored as decimal text
    Integer(i64),

    /// 64-bit float, stored as decimal text
    Float(f64),

    /// Boolean, stored as "1" or "0"
    Boolean(bool),

    /// Composite value, stored in bincode form
    Serialized(Bytes),
}

impl Value {
    // -------------------------------------------------------------------------
    // Classification
    // -------------------------------------------------------------------------

    /// Classify any serializable value by its natural kind.
    ///
    /// Strings, integers, floats and booleans map onto their own variants;
    /// everything else (sequences, maps, structs, unit, options of composite
    /// values) is serialized with bincode.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
        match serde_json::to_value(value) {
            Ok(serde_json::Value::String(text)) => Ok(Value::String(Bytes::from(text))),
            Ok(serde_json::Value::Bool(flag)) => Ok(Value::Boolean(flag)),
            Ok(serde_json::Value::Number(number)) => {
                if let Some(int) = number.as_i64() {
                    Ok(Value::Integer(int))
                } else if number.is_u64() {
                    Err(MemwireError::UnsupportedValueType(format!(
                        "unsigned integer {} does not fit a signed 64-bit integer",
                        number
                    )))
                } else {
                    number.as_f64().map(Value::Float).ok_or_else(|| {
                        MemwireError::UnsupportedValueType(format!("number {}", number))
                    })
                }
            }
            // Maps with non-string keys do not fit JSON; bincode still handles them.
            Ok(_) | Err(_) => Value::serialized(value),
        }
    }

    /// Serialize a composite value with bincode
    pub fn serialized<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
        let bytes =
            bincode::serialize(value).map_err(|e| MemwireError::Serialization(e.to_string()))?;
        Ok(Value::Serialized(Bytes::from(bytes)))
    }

    /// Restore a typed Rust value, inverse of [`Value::from_serialize`]
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        let json = match self {
            Value::Serialized(bytes) => {
                return bincode::deserialize(bytes)
                    .map_err(|e| MemwireError::Serialization(e.to_string()));
            }
            Value::String(bytes) => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| MemwireError::Serialization(e.to_string()))?;
                serde_json::Value::String(text.to_owned())
            }
            Value::Integer(int) => serde_json::Value::from(*int),
            Value::Float(float) => serde_json::Value::from(*float),
            Value::Boolean(flag) => serde_json::Value::Bool(*flag),
        };
        serde_json::from_value(json).map_err(|e| MemwireError::Serialization(e.to_string()))
    }

    /// The kind this value is tagged with
    pub fn kind(&self) -> Kind {
        match self {
            Value::String(_) => Kind::String,
            Value::Integer(_) => Kind::Integer,
            Value::Float(_) => Kind::Float,
            Value::Boolean(_) => Kind::Boolean,
            Value::Serialized(_) => Kind::Serialized,
        }
    }

    // -------------------------------------------------------------------------
    // Wire Encoding/Decoding
    // -------------------------------------------------------------------------

    /// Encode to the wire payload and its flags word.
    ///
    /// The byte length sent in the command line is `payload.len()`, taken
    /// after serialization.
    pub fn encode(&self) -> (Bytes, u32) {
        match self {
            Value::String(bytes) => (bytes.clone(), FLAG_STRING),
            Value::Integer(int) => (Bytes::from(int.to_string()), FLAG_INTEGER),
            Value::Float(float) => (Bytes::from(float.to_string()), FLAG_FLOAT),
            Value::Boolean(flag) => (Bytes::from_static(if *flag { b"1" } else { b"0" }), FLAG_BOOLEAN),
            Value::Serialized(bytes) => (bytes.clone(), FLAG_SERIALIZED),
        }
    }

    /// Decode a wire payload according to its flags word.
    ///
    /// Flags this codec does not know leave the payload as a raw string.
    pub fn decode(payload: Bytes, flags: u32) -> Result<Value> {
        let kind = match Kind::from_flags(flags) {
            Some(kind) => kind,
            None => return Ok(Value::String(payload)),
        };

        match kind {
            Kind::String => Ok(Value::String(payload)),
            Kind::Integer => parse_number(&payload, "integer").map(Value::Integer),
            Kind::Float => parse_number(&payload, "float").map(Value::Float),
            Kind::Boolean => parse_boolean(&payload).map(Value::Boolean),
            Kind::Serialized => Ok(Value::Serialized(payload)),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// UTF-8 view of a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// Raw bytes of a string or serialized value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(bytes) | Value::Serialized(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(int) => Some(*int),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(float) => Some(*float),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(flag) => Some(*flag),
            _ => None,
        }
    }
}

fn parse_number<T: FromStr>(payload: &[u8], what: &str) -> Result<T> {
    // The server may space-pad a counter that shrank after decr.
    std::str::from_utf8(payload)
        .ok()
        .map(str::trim)
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| {
            MemwireError::Serialization(format!(
                "payload {:?} is not a valid {}",
                String::from_utf8_lossy(payload),
                what
            ))
        })
}

fn parse_boolean(payload: &[u8]) -> Result<bool> {
    match payload.trim_ascii() {
        b"1" | b"true" => Ok(true),
        b"" | b"0" | b"false" => Ok(false),
        other => Err(MemwireError::Serialization(format!(
            "payload {:?} is not a valid boolean",
            String::from_utf8_lossy(other)
        ))),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Value::Integer(int) => write!(f, "{}", int),
            Value::Float(float) => write!(f, "{}", float),
            Value::Boolean(flag) => write!(f, "{}", flag),
            Value::Serialized(bytes) => write!(f, "<serialized {} bytes>", bytes.len()),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(Bytes::copy_from_slice(text.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::String(Bytes::from(text))
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::String(Bytes::copy_from_slice(bytes))
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::String(Bytes::from(bytes))
    }
}

impl From<Bytes> for Value {
    fn from(bytes: Bytes) -> Self {
        Value::String(bytes)
    }
}

impl From<i64> for Value {
    fn from(int: i64) -> Self {
        Value::Integer(int)
    }
}

impl From<i32> for Value {
    fn from(int: i32) -> Self {
        Value::Integer(int.into())
    }
}

impl From<u32> for Value {
    fn from(int: u32) -> Self {
        Value::Integer(int.into())
    }
}

impl From<f64> for Value {
    fn from(float: f64) -> Self {
        Value::Float(float)
    }
}

impl From<f32> for Value {
    fn from(float: f32) -> Self {
        Value::Float(float.into())
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Boolean(flag)
    }
}

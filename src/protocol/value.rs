//! Value decoding
//!
//! Turns a reply payload into a typed [`Value`]. The same scalar routine is
//! used for top-level value replies and for every entry of a map reply.
//!
//! ### Map Payload
//! ```text
//! count (4)
//! repeated count times:
//!   key_len (4) + key + encoding (1) + value_len (4) + value
//! ```

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;

use crate::error::{DecodeError, GibsonError, Result};
use super::codec::Frame;
use super::reply::{error_message, Encoding, ReplyKind};

/// A decoded reply value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// PLAIN encoded scalar
    Text(String),

    /// NUMBER encoded scalar
    Integer(i64),

    /// Key/value reply
    Map(ValueMap),

    /// Payload of a reply code with no value semantics
    Bytes(Bytes),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Map(map) => {
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{} => {}", key, value)?;
                }
                Ok(())
            }
            Value::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
        }
    }
}

/// Insertion-ordered map of key to value
///
/// Inserting an existing key replaces its value in place.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ValueMap {
    entries: Vec<(String, Value)>,

    /// Key -> position in `entries`
    index: HashMap<String, usize>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a pair, returning the previous value for the key
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl fmt::Debug for ValueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl IntoIterator for ValueMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a complete reply frame
pub fn decode_frame(frame: &Frame) -> Result<Value> {
    decode(frame.code, frame.encoding, &frame.payload)
}

/// Decode a reply payload according to its code and encoding.
///
/// Error codes resolve to [`GibsonError::Server`] carrying the mapped message
/// and the raw payload.
pub fn decode(code: u16, encoding: u8, data: &Bytes) -> Result<Value> {
    match ReplyKind::of(code) {
        ReplyKind::Error => match error_message(code) {
            Some(message) => Err(GibsonError::Server {
                code,
                message,
                payload: data.clone(),
            }),
            None => Err(DecodeError::UnknownErrorCode(code).into()),
        },
        ReplyKind::Value => Ok(decode_scalar(encoding, data)?),
        ReplyKind::Map => Ok(decode_map(data)?),
        ReplyKind::Opaque => Ok(Value::Bytes(data.clone())),
    }
}

/// Decode one scalar (PLAIN or NUMBER)
pub fn decode_scalar(encoding: u8, data: &[u8]) -> std::result::Result<Value, DecodeError> {
    match Encoding::from_u8(encoding) {
        Some(Encoding::Plain) => Ok(Value::Text(String::from_utf8_lossy(data).into_owned())),
        Some(Encoding::Number) => decode_number(data).map(Value::Integer),
        _ => Err(DecodeError::UnknownEncoding(encoding)),
    }
}

/// 8 bytes are a signed 64 bit integer, anything shorter than that but at
/// least 4 bytes is read as a signed 32 bit integer.
fn decode_number(data: &[u8]) -> std::result::Result<i64, DecodeError> {
    if data.len() == 8 {
        let lo = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let hi = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        return Ok(i64_from_words(lo, hi));
    }

    if data.len() < 4 {
        return Err(DecodeError::Truncated {
            field: "number",
            needed: 4,
            remaining: data.len(),
        });
    }
    Ok(i32::from_le_bytes([data[0], data[1], data[2], data[3]]) as i64)
}

/// Rebuild a signed 64 bit integer from its two little-endian 32 bit words.
///
/// Negative values are rebuilt as `-((!hi << 32) + !lo + 1)`; the magnitude
/// tops out at 2^63, which fits in a u64.
pub fn i64_from_words(lo: u32, hi: u32) -> i64 {
    if hi & 0x8000_0000 == 0 {
        return ((hi as i64) << 32) | lo as i64;
    }

    let magnitude = (((!hi) as u64) << 32) + (!lo) as u64 + 1;
    (magnitude as i64).wrapping_neg()
}

fn decode_map(data: &[u8]) -> std::result::Result<Value, DecodeError> {
    let mut cursor = PayloadCursor::new(data);
    let count = cursor.read_u32("entry count")? as usize;

    // Every entry takes at least 9 bytes
    let mut map = ValueMap::with_capacity(count.min(cursor.remaining() / 9));
    for _ in 0..count {
        let key_len = cursor.read_u32("key length")? as usize;
        let key = String::from_utf8_lossy(cursor.take(key_len, "key")?).into_owned();
        let encoding = cursor.read_u8("value encoding")?;
        let value_len = cursor.read_u32("value size")? as usize;
        let value = decode_scalar(encoding, cursor.take(value_len, "value")?)?;
        map.insert(key, value);
    }

    Ok(Value::Map(map))
}

/// Bounds-checked reader over a payload
struct PayloadCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> PayloadCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take(&mut self, n: usize, field: &'static str) -> std::result::Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Truncated {
                field,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    fn read_u8(&mut self, field: &'static str) -> std::result::Result<u8, DecodeError> {
        Ok(self.take(1, field)?[0])
    }

    fn read_u32(&mut self, field: &'static str) -> std::result::Result<u32, DecodeError> {
        let b = self.take(4, field)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

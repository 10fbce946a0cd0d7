//! Record encoder

use crate::coding::Coding;
use crate::tag::ValueTag;

/// Appends tagged fields to an in-memory record.
///
/// Keys are short ASCII identifiers chosen by the entity (`"i"`, `"fn"`,
/// `"ph"`). They are written with a one-byte length prefix, so a key must
/// not exceed 255 bytes.
#[derive(Debug, Default, Clone)]
pub struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    /// Create an empty encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with preallocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    fn write_key(&mut self, key: &str, tag: ValueTag) {
        debug_assert!(
            !key.is_empty() && key.len() <= u8::MAX as usize && key.is_ascii(),
            "field keys must be 1..=255 ASCII bytes"
        );
        self.buffer.push(key.len() as u8);
        self.buffer.extend_from_slice(key.as_bytes());
        self.buffer.push(tag.as_u8());
    }

    fn write_len(&mut self, len: usize) {
        self.buffer.extend_from_slice(&(len as u32).to_le_bytes());
    }

    fn write_blob(&mut self, bytes: &[u8]) {
        self.write_len(bytes.len());
        self.buffer.extend_from_slice(bytes);
    }

    /// Encode a 32-bit integer
    pub fn encode_i32(&mut self, key: &str, value: i32) {
        self.write_key(key, ValueTag::Int32);
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Encode a 64-bit integer
    pub fn encode_i64(&mut self, key: &str, value: i64) {
        self.write_key(key, ValueTag::Int64);
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Encode a boolean
    pub fn encode_bool(&mut self, key: &str, value: bool) {
        self.write_key(key, ValueTag::Bool);
        self.buffer.push(value as u8);
    }

    /// Encode a double
    pub fn encode_f64(&mut self, key: &str, value: f64) {
        self.write_key(key, ValueTag::Double);
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Encode a string
    pub fn encode_str(&mut self, key: &str, value: &str) {
        self.write_key(key, ValueTag::String);
        self.write_blob(value.as_bytes());
    }

    /// Encode raw bytes
    pub fn encode_bytes(&mut self, key: &str, value: &[u8]) {
        self.write_key(key, ValueTag::Bytes);
        self.write_blob(value);
    }

    /// Mark an optional field as explicitly unset
    pub fn encode_nil(&mut self, key: &str) {
        self.write_key(key, ValueTag::Nil);
    }

    /// Encode an optional string, writing an explicit nil when absent
    pub fn encode_optional_str(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(value) => self.encode_str(key, value),
            None => self.encode_nil(key),
        }
    }

    /// Encode an optional 32-bit integer, writing an explicit nil when absent
    pub fn encode_optional_i32(&mut self, key: &str, value: Option<i32>) {
        match value {
            Some(value) => self.encode_i32(key, value),
            None => self.encode_nil(key),
        }
    }

    /// Encode a nested record
    pub fn encode_object<T: Coding>(&mut self, key: &str, value: &T) {
        self.write_key(key, ValueTag::Object);
        let mut nested = Encoder::new();
        value.encode(&mut nested);
        self.write_blob(&nested.buffer);
    }

    /// Encode an optional nested record, writing an explicit nil when absent
    pub fn encode_optional_object<T: Coding>(&mut self, key: &str, value: Option<&T>) {
        match value {
            Some(value) => self.encode_object(key, value),
            None => self.encode_nil(key),
        }
    }

    /// Encode a homogeneous sequence of nested records
    pub fn encode_object_array<T: Coding>(&mut self, key: &str, values: &[T]) {
        self.write_key(key, ValueTag::ObjectArray);
        self.write_len(values.len());
        let mut nested = Encoder::new();
        for value in values {
            nested.buffer.clear();
            value.encode(&mut nested);
            self.write_blob(&nested.buffer);
        }
    }

    /// Encode a sequence of 32-bit integers
    pub fn encode_i32_array(&mut self, key: &str, values: &[i32]) {
        self.write_key(key, ValueTag::Int32Array);
        self.write_len(values.len());
        for value in values {
            self.buffer.extend_from_slice(&value.to_le_bytes());
        }
    }

    /// Encode a sequence of 64-bit integers
    pub fn encode_i64_array(&mut self, key: &str, values: &[i64]) {
        self.write_key(key, ValueTag::Int64Array);
        self.write_len(values.len());
        for value in values {
            self.buffer.extend_from_slice(&value.to_le_bytes());
        }
    }

    /// Encode a sequence of byte strings
    pub fn encode_bytes_array<B: AsRef<[u8]>>(&mut self, key: &str, values: &[B]) {
        self.write_key(key, ValueTag::BytesArray);
        self.write_len(values.len());
        for value in values {
            self.write_blob(value.as_ref());
        }
    }

    /// Bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether no field has been written
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consume the encoder and return the record bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

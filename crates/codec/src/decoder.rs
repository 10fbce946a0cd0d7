//! Record decoder
//!
//! The decoder walks the whole record once on construction and indexes
//! every field by key. Structural damage (truncation, an unknown tag,
//! invalid UTF-8) is reported up front; after that, lookups are cheap and
//! never fail except when decoding nested records.
//!
//! Lookups are lenient in the same way for every type: a missing key, an
//! explicit nil, or a field with a different tag all read as "absent".

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::coding::Coding;
use crate::error::{CodecError, Result};
use crate::tag::ValueTag;

/// Presence of a field in a decoded record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    /// Key was never written
    Missing,
    /// Key was written with an explicit nil
    Unset,
    /// Key carries a value
    Present(ValueTag),
}

#[derive(Debug, Clone, Copy)]
struct Field<'a> {
    key: &'a str,
    tag: ValueTag,
    value: &'a [u8],
}

/// Indexed read access to one encoded record
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    fields: Vec<Field<'a>>,
}

fn take<'a>(data: &'a [u8], cursor: &mut usize, len: usize) -> Result<&'a [u8]> {
    let end = cursor
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .ok_or(CodecError::UnexpectedEof { offset: *cursor })?;
    let slice = &data[*cursor..end];
    *cursor = end;
    Ok(slice)
}

fn read_len(data: &[u8], cursor: &mut usize) -> Result<usize> {
    let offset = *cursor;
    let bytes = take(data, cursor, 4)?;
    let mut reader = Cursor::new(bytes);
    reader
        .read_u32::<LittleEndian>()
        .map(|len| len as usize)
        .map_err(|_| CodecError::UnexpectedEof { offset })
}

/// Size in bytes of a value with the given tag starting at `cursor`.
fn value_len(data: &[u8], start: usize, tag: ValueTag) -> Result<usize> {
    let mut cursor = start;
    match tag {
        ValueTag::Int32 => take(data, &mut cursor, 4).map(|_| ())?,
        ValueTag::Int64 | ValueTag::Double => take(data, &mut cursor, 8).map(|_| ())?,
        ValueTag::Bool => take(data, &mut cursor, 1).map(|_| ())?,
        ValueTag::Nil => {}
        ValueTag::String | ValueTag::Object | ValueTag::Bytes => {
            let len = read_len(data, &mut cursor)?;
            take(data, &mut cursor, len)?;
        }
        ValueTag::Int32Array => {
            let count = read_len(data, &mut cursor)?;
            take(data, &mut cursor, count.saturating_mul(4))?;
        }
        ValueTag::Int64Array => {
            let count = read_len(data, &mut cursor)?;
            take(data, &mut cursor, count.saturating_mul(8))?;
        }
        ValueTag::ObjectArray | ValueTag::BytesArray => {
            let count = read_len(data, &mut cursor)?;
            for _ in 0..count {
                let len = read_len(data, &mut cursor)?;
                take(data, &mut cursor, len)?;
            }
        }
    }
    Ok(cursor - start)
}

/// Split a count-prefixed sequence of length-prefixed blobs.
fn blobs(value: &[u8]) -> Result<Vec<&[u8]>> {
    let mut cursor = 0;
    let count = read_len(value, &mut cursor)?;
    let mut out = Vec::with_capacity(count.min(value.len()));
    for _ in 0..count {
        let len = read_len(value, &mut cursor)?;
        out.push(take(value, &mut cursor, len)?);
    }
    Ok(out)
}

impl<'a> Decoder<'a> {
    /// Index every field of `data`.
    ///
    /// Fails only on structural damage. Unknown keys are indexed like any
    /// other and simply never looked up.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let mut fields = Vec::new();
        let mut cursor = 0;

        while cursor < data.len() {
            let key_offset = cursor;
            let key_len = take(data, &mut cursor, 1)?[0] as usize;
            if key_len == 0 {
                return Err(CodecError::InvalidKey { offset: key_offset });
            }
            let key_bytes = take(data, &mut cursor, key_len)?;
            if !key_bytes.is_ascii() {
                return Err(CodecError::InvalidKey { offset: key_offset });
            }
            let key = std::str::from_utf8(key_bytes)
                .map_err(|_| CodecError::InvalidKey { offset: key_offset })?;

            let tag_offset = cursor;
            let raw_tag = take(data, &mut cursor, 1)?[0];
            let tag = ValueTag::from_u8(raw_tag).ok_or(CodecError::UnknownTag {
                tag: raw_tag,
                offset: tag_offset,
            })?;

            let len = value_len(data, cursor, tag)?;
            let value = take(data, &mut cursor, len)?;

            if tag == ValueTag::String && std::str::from_utf8(&value[4..]).is_err() {
                return Err(CodecError::InvalidUtf8 {
                    key: key.to_string(),
                });
            }

            fields.push(Field { key, tag, value });
        }

        Ok(Self { fields })
    }

    fn field(&self, key: &str) -> Option<&Field<'a>> {
        self.fields.iter().find(|field| field.key == key)
    }

    fn value(&self, key: &str, tag: ValueTag) -> Option<&'a [u8]> {
        self.field(key)
            .filter(|field| field.tag == tag)
            .map(|field| field.value)
    }

    /// Number of fields in the record, known or not
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Keys in write order
    pub fn keys(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.fields.iter().map(|field| field.key)
    }

    /// Distinguish a missing key from an explicit nil
    pub fn field_state(&self, key: &str) -> FieldState {
        match self.field(key) {
            None => FieldState::Missing,
            Some(field) if field.tag == ValueTag::Nil => FieldState::Unset,
            Some(field) => FieldState::Present(field.tag),
        }
    }

    /// Whether the key was written with an explicit nil
    pub fn is_nil(&self, key: &str) -> bool {
        self.field_state(key) == FieldState::Unset
    }

    /// Read a 32-bit integer
    pub fn decode_optional_i32(&self, key: &str) -> Option<i32> {
        self.value(key, ValueTag::Int32)
            .and_then(|v| Cursor::new(v).read_i32::<LittleEndian>().ok())
    }

    /// Read a 32-bit integer or fall back to `default`
    pub fn decode_i32_or(&self, key: &str, default: i32) -> i32 {
        self.decode_optional_i32(key).unwrap_or(default)
    }

    /// Read a 64-bit integer
    pub fn decode_optional_i64(&self, key: &str) -> Option<i64> {
        self.value(key, ValueTag::Int64)
            .and_then(|v| Cursor::new(v).read_i64::<LittleEndian>().ok())
    }

    /// Read a 64-bit integer or fall back to `default`
    pub fn decode_i64_or(&self, key: &str, default: i64) -> i64 {
        self.decode_optional_i64(key).unwrap_or(default)
    }

    /// Read a boolean
    pub fn decode_optional_bool(&self, key: &str) -> Option<bool> {
        self.value(key, ValueTag::Bool).map(|v| v[0] != 0)
    }

    /// Read a boolean or fall back to `default`
    pub fn decode_bool_or(&self, key: &str, default: bool) -> bool {
        self.decode_optional_bool(key).unwrap_or(default)
    }

    /// Read a double
    pub fn decode_optional_f64(&self, key: &str) -> Option<f64> {
        self.value(key, ValueTag::Double)
            .and_then(|v| Cursor::new(v).read_f64::<LittleEndian>().ok())
    }

    /// Read a double or fall back to `default`
    pub fn decode_f64_or(&self, key: &str, default: f64) -> f64 {
        self.decode_optional_f64(key).unwrap_or(default)
    }

    /// Borrow a string value
    pub fn decode_optional_str(&self, key: &str) -> Option<&'a str> {
        // UTF-8 was validated when the record was indexed
        self.value(key, ValueTag::String)
            .and_then(|v| std::str::from_utf8(&v[4..]).ok())
    }

    /// Read an owned string
    pub fn decode_optional_string(&self, key: &str) -> Option<String> {
        self.decode_optional_str(key).map(str::to_owned)
    }

    /// Read an owned string or fall back to `default`
    pub fn decode_string_or(&self, key: &str, default: &str) -> String {
        self.decode_optional_str(key).unwrap_or(default).to_owned()
    }

    /// Borrow a byte value
    pub fn decode_optional_bytes(&self, key: &str) -> Option<&'a [u8]> {
        self.value(key, ValueTag::Bytes).map(|v| &v[4..])
    }

    /// Decode a nested record
    pub fn decode_object<T: Coding>(&self, key: &str) -> Result<Option<T>> {
        match self.value(key, ValueTag::Object) {
            Some(value) => {
                let nested = Decoder::new(&value[4..])?;
                T::decode(&nested).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Decode a sequence of nested records; absent reads as empty
    pub fn decode_object_array<T: Coding>(&self, key: &str) -> Result<Vec<T>> {
        match self.value(key, ValueTag::ObjectArray) {
            Some(value) => blobs(value)?
                .into_iter()
                .map(|blob| Decoder::new(blob).and_then(|nested| T::decode(&nested)))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Read a sequence of 32-bit integers; absent reads as empty
    pub fn decode_i32_array(&self, key: &str) -> Vec<i32> {
        let Some(value) = self.value(key, ValueTag::Int32Array) else {
            return Vec::new();
        };
        let mut reader = Cursor::new(&value[4..]);
        let mut out = Vec::with_capacity((value.len() - 4) / 4);
        while let Ok(v) = reader.read_i32::<LittleEndian>() {
            out.push(v);
        }
        out
    }

    /// Read a sequence of 64-bit integers; absent reads as empty
    pub fn decode_i64_array(&self, key: &str) -> Vec<i64> {
        let Some(value) = self.value(key, ValueTag::Int64Array) else {
            return Vec::new();
        };
        let mut reader = Cursor::new(&value[4..]);
        let mut out = Vec::with_capacity((value.len() - 4) / 8);
        while let Ok(v) = reader.read_i64::<LittleEndian>() {
            out.push(v);
        }
        out
    }

    /// Borrow a sequence of byte strings; absent reads as empty
    pub fn decode_bytes_array(&self, key: &str) -> Result<Vec<&'a [u8]>> {
        match self.value(key, ValueTag::BytesArray) {
            Some(value) => blobs(value),
            None => Ok(Vec::new()),
        }
    }
}

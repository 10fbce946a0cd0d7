//! Value type tags

/// One-byte tag written after every field key.
///
/// Tag values are part of the persisted format and must never be
/// renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueTag {
    /// 4-byte signed integer
    Int32 = 0,
    /// 8-byte signed integer
    Int64 = 1,
    /// Single byte, 0 or 1
    Bool = 2,
    /// 8-byte IEEE 754 double
    Double = 3,
    /// len(4) + UTF-8 bytes
    String = 4,
    /// len(4) + nested record
    Object = 5,
    /// count(4) + count * i32
    Int32Array = 6,
    /// count(4) + count * i64
    Int64Array = 7,
    /// count(4) + count * (len(4) + nested record)
    ObjectArray = 8,
    /// Explicitly unset optional, no payload
    Nil = 9,
    /// len(4) + raw bytes
    Bytes = 10,
    /// count(4) + count * (len(4) + raw bytes)
    BytesArray = 11,
}

impl ValueTag {
    /// Parse a raw tag byte
    pub fn from_u8(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => ValueTag::Int32,
            1 => ValueTag::Int64,
            2 => ValueTag::Bool,
            3 => ValueTag::Double,
            4 => ValueTag::String,
            5 => ValueTag::Object,
            6 => ValueTag::Int32Array,
            7 => ValueTag::Int64Array,
            8 => ValueTag::ObjectArray,
            9 => ValueTag::Nil,
            10 => ValueTag::Bytes,
            11 => ValueTag::BytesArray,
            _ => return None,
        })
    }

    /// Raw tag byte
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

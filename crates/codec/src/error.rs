//! Codec errors

use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised while decoding a record.
///
/// Encoding never fails; every error here comes from reading bytes that
/// are truncated, corrupted or written by an incompatible writer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Record ended in the middle of a field
    #[error("Unexpected end of data at offset {offset}")]
    UnexpectedEof {
        /// Offset at which more bytes were expected
        offset: usize,
    },

    /// String value is not valid UTF-8
    #[error("Invalid UTF-8 in field '{key}'")]
    InvalidUtf8 {
        /// Key of the offending field
        key: String,
    },

    /// Type tag this reader cannot size, so the rest of the record is unreadable
    #[error("Unknown value tag {tag} at offset {offset}")]
    UnknownTag {
        /// Raw tag byte
        tag: u8,
        /// Offset of the tag byte
        offset: usize,
    },

    /// Field key is empty or not ASCII
    #[error("Invalid field key at offset {offset}")]
    InvalidKey {
        /// Offset of the key length byte
        offset: usize,
    },

    /// A field the entity cannot be built without is absent
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
}

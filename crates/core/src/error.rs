//! Error types for the Stockpile store
//!
//! Remote and decode failures never reach this type: the loader folds them
//! into `LoadState::Empty`. What remains are failures of the store itself.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use stockpile_codec::CodecError;
use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Name under which the store error is exposed by higher layers
pub type StoreError = Error;

/// Error types for the store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A transaction could not be opened
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store was closed; no further transactions are accepted
    #[error("Store closed")]
    Closed,

    /// A persisted record could not be decoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl Error {
    /// Whether this error means no transaction could run at all
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_) | Error::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unavailable() {
        let err = Error::StoreUnavailable("lock timeout after 5000ms".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Store unavailable"));
        assert!(msg.contains("5000ms"));
    }

    #[test]
    fn test_error_from_codec() {
        let err: Error = CodecError::MissingField("i").into();
        assert!(matches!(err, Error::Codec(_)));
        assert!(err.to_string().contains("Codec error"));
    }

    #[test]
    fn test_is_unavailable() {
        assert!(Error::Closed.is_unavailable());
        assert!(Error::StoreUnavailable("x".into()).is_unavailable());
        assert!(!Error::InvalidOperation("x".into()).is_unavailable());
        assert!(!Error::Codec(CodecError::UnexpectedEof { offset: 0 }).is_unavailable());
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_error() -> Result<i32> {
            Err(Error::Closed)
        }
        assert_eq!(returns_error(), Err(Error::Closed));
    }
}

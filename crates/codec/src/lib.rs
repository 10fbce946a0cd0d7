//! Key-tagged binary record codec
//!
//! Every persisted entity is a flat record of fields. A field is a short
//! ASCII key, a one-byte type tag and the tagged value. The format carries
//! no version: readers look fields up by key, fall back to defaults for
//! missing keys and skip keys they do not know.
//!
//! # Field Layout
//!
//! ```text
//! ┌──────────────┬─────────────┬───────────┬──────────────────────┐
//! │ KeyLen (1)   │ Key (ASCII) │ Tag (1)   │ Value (per tag)      │
//! └──────────────┴─────────────┴───────────┴──────────────────────┘
//! ```
//!
//! Optional fields that are absent on purpose are written with the
//! [`ValueTag::Nil`] tag, so a reader can tell "never written" apart from
//! "explicitly unset" through [`Decoder::field_state`].
//!
//! All integers are little-endian.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coding;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod tag;

pub use coding::{decode_from_slice, encode_to_vec, Coding};
pub use decoder::{Decoder, FieldState};
pub use encoder::Encoder;
pub use error::{CodecError, Result};
pub use tag::ValueTag;

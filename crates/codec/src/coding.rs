//! Entity coding trait

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Result;

/// Symmetric encode/decode for a persisted entity.
///
/// Implementations write every field they own, including explicit nils for
/// optional fields that are absent, and read back with defaults for keys
/// that are missing. Decoding must tolerate keys it does not know.
pub trait Coding: Sized {
    /// Write this value's fields
    fn encode(&self, encoder: &mut Encoder);

    /// Rebuild a value from an indexed record
    fn decode(decoder: &Decoder<'_>) -> Result<Self>;
}

/// Encode a value into a standalone record
pub fn encode_to_vec<T: Coding>(value: &T) -> Vec<u8> {
    let mut encoder = Encoder::new();
    value.encode(&mut encoder);
    encoder.into_bytes()
}

/// Decode a value from a standalone record
pub fn decode_from_slice<T: Coding>(data: &[u8]) -> Result<T> {
    let decoder = Decoder::new(data)?;
    T::decode(&decoder)
}

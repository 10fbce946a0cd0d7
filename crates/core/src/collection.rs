//! Item collections
//!
//! A collection is an installable group of items (a sticker or mask pack)
//! plus its metadata. Values are immutable: an update to a collection
//! produces a new `CollectionInfo`, never a mutation of the stored one.

use stockpile_codec::{Coding, CodecError, Decoder, Encoder};

use crate::types::{CollectionId, ItemIndex, LabelKey, MediaId};

/// Caller-supplied collection address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// Numeric id plus access credential (0 when unknown)
    Id {
        /// Collection id, namespace not yet resolved
        id: i64,
        /// Access credential
        access_hash: i64,
    },
    /// Short name
    Name(String),
}

impl From<&CollectionInfo> for Reference {
    fn from(info: &CollectionInfo) -> Self {
        Reference::Id {
            id: info.id.id,
            access_hash: info.access_hash,
        }
    }
}

/// Collection metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    /// Resolved id
    pub id: CollectionId,
    /// Access credential
    pub access_hash: i64,
    /// Display title
    pub title: String,
    /// Short name used for by-name references
    pub short_name: String,
    /// Content hash reported by the remote
    pub hash: i32,
    /// Number of items reported by the remote
    pub count: i32,
}

impl Coding for CollectionInfo {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.encode_i32("n", self.id.namespace);
        encoder.encode_i64("i", self.id.id);
        encoder.encode_i64("a", self.access_hash);
        encoder.encode_str("t", &self.title);
        encoder.encode_str("s", &self.short_name);
        encoder.encode_i32("h", self.hash);
        encoder.encode_i32("c", self.count);
    }

    fn decode(decoder: &Decoder<'_>) -> stockpile_codec::Result<Self> {
        let id = decoder
            .decode_optional_i64("i")
            .ok_or(CodecError::MissingField("i"))?;
        Ok(Self {
            id: CollectionId::new(decoder.decode_i32_or("n", 0), id),
            access_hash: decoder.decode_i64_or("a", 0),
            title: decoder.decode_string_or("t", ""),
            short_name: decoder.decode_string_or("s", ""),
            hash: decoder.decode_i32_or("h", 0),
            count: decoder.decode_i32_or("c", 0),
        })
    }
}

/// Media payload of an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Media id
    pub id: MediaId,
    /// MIME type
    pub mime_type: String,
    /// Size in bytes, when known
    pub size: Option<i32>,
    /// Original file name, when known
    pub file_name: Option<String>,
}

impl Coding for MediaFile {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.encode_i32("n", self.id.namespace);
        encoder.encode_i64("i", self.id.id);
        encoder.encode_str("m", &self.mime_type);
        encoder.encode_optional_i32("s", self.size);
        encoder.encode_optional_str("fn", self.file_name.as_deref());
    }

    fn decode(decoder: &Decoder<'_>) -> stockpile_codec::Result<Self> {
        let id = decoder
            .decode_optional_i64("i")
            .ok_or(CodecError::MissingField("i"))?;
        Ok(Self {
            id: MediaId::new(decoder.decode_i32_or("n", 0), id),
            mime_type: decoder.decode_string_or("m", ""),
            size: decoder.decode_optional_i32("s"),
            file_name: decoder.decode_optional_string("fn"),
        })
    }
}

/// Member of a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Ordinal and stable id
    pub index: ItemIndex,
    /// Media payload
    pub file: MediaFile,
    /// Secondary lookup keys
    pub labels: Vec<LabelKey>,
}

impl Coding for Item {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.encode_i32("i", self.index.index);
        encoder.encode_i64("d", self.index.id);
        encoder.encode_object("f", &self.file);
        encoder.encode_bytes_array("k", &self.labels);
    }

    fn decode(decoder: &Decoder<'_>) -> stockpile_codec::Result<Self> {
        let file = decoder
            .decode_object::<MediaFile>("f")?
            .ok_or(CodecError::MissingField("f"))?;
        let labels = decoder
            .decode_bytes_array("k")?
            .into_iter()
            .map(LabelKey::from)
            .collect();
        Ok(Self {
            index: ItemIndex::new(decoder.decode_i32_or("i", 0), decoder.decode_i64_or("d", 0)),
            file,
            labels,
        })
    }
}

/// State published by the collection loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// A load is in progress
    Fetching,
    /// The collection does not exist or could not be fetched
    Empty,
    /// The collection is known
    Result {
        /// Collection metadata
        info: CollectionInfo,
        /// Items in ordinal order
        items: Vec<Item>,
        /// Whether the collection is persisted in the local store
        installed: bool,
    },
}

impl LoadState {
    /// Whether this is a terminal state (anything but `Fetching`)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadState::Fetching)
    }
}

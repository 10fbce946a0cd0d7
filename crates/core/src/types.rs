//! Identifier types
//!
//! Identifiers are namespaced: the same numeric id may appear in several
//! namespaces and refers to different entities in each. Namespace numbers
//! are persisted and must never be renumbered.

use std::fmt;

/// Namespace constants
pub mod namespaces {
    /// Item collection namespaces, in lookup priority order
    pub mod item_collection {
        /// Remote sticker packs
        pub const CLOUD_STICKER_PACKS: i32 = 0;
        /// Remote mask packs
        pub const CLOUD_MASK_PACKS: i32 = 1;

        /// Namespaces probed when resolving a by-id reference, highest priority first
        pub const PROBE_ORDER: [i32; 2] = [CLOUD_STICKER_PACKS, CLOUD_MASK_PACKS];
    }

    /// Media namespaces
    pub mod media {
        /// Remote documents
        pub const CLOUD_FILE: i32 = 0;
    }

    /// Peer namespaces
    pub mod peer {
        /// Remote users
        pub const CLOUD_USER: i32 = 0;
    }
}

/// Identifier of an item collection, unique per namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionId {
    /// Collection namespace
    pub namespace: i32,
    /// Id within the namespace
    pub id: i64,
}

impl CollectionId {
    /// Create a collection id
    pub const fn new(namespace: i32, id: i64) -> Self {
        Self { namespace, id }
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.id)
    }
}

/// Identifier of a media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaId {
    /// Media namespace
    pub namespace: i32,
    /// Id within the namespace
    pub id: i64,
}

impl MediaId {
    /// Create a media id
    pub const fn new(namespace: i32, id: i64) -> Self {
        Self { namespace, id }
    }
}

/// Identifier of a peer (user profile)
///
/// Persisted as a single `i64` with the namespace in the high 32 bits and
/// the id in the low 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId {
    /// Peer namespace
    pub namespace: i32,
    /// Id within the namespace
    pub id: i32,
}

impl PeerId {
    /// Create a peer id
    pub const fn new(namespace: i32, id: i32) -> Self {
        Self { namespace, id }
    }

    /// Pack into the persisted `i64` form
    pub const fn to_i64(self) -> i64 {
        ((self.namespace as i64) << 32) | (self.id as u32 as i64)
    }

    /// Unpack from the persisted `i64` form
    pub const fn from_i64(raw: i64) -> Self {
        Self {
            namespace: (raw >> 32) as i32,
            id: raw as i32,
        }
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.id)
    }
}

/// Position of an item inside its collection
///
/// `index` is the ordinal assigned in decode order; `id` is the item's
/// stable identifier. Items sort by index first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemIndex {
    /// Ordinal within the collection
    pub index: i32,
    /// Stable item id
    pub id: i64,
}

impl ItemIndex {
    /// Create an item index
    pub const fn new(index: i32, id: i64) -> Self {
        Self { index, id }
    }
}

/// Opaque secondary lookup key attached to an item
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LabelKey(Vec<u8>);

impl LabelKey {
    /// Wrap raw key bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for LabelKey {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl From<&[u8]> for LabelKey {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for LabelKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for LabelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) => write!(f, "LabelKey({:?})", text),
            Err(_) => write!(f, "LabelKey({:02x?})", self.0),
        }
    }
}

//! Remote service interface
//!
//! The transport itself lives outside this crate. What is defined here is
//! the shape of what it returns (the `Api*` types, mirroring the remote
//! schema) and the conversions from those shapes into stored records.

use std::num::NonZeroI64;

use rustc_hash::FxHashMap;
use stockpile_core::{
    namespaces, parse_user_flags, CollectionId, CollectionInfo, ImageRepresentation, Item,
    ItemIndex, LabelKey, MediaFile, MediaId, PeerId, Reference, User,
};
use stockpile_signal::Signal;
use thiserror::Error;

/// Set-flag bit marking a collection as a mask pack
pub const STICKER_SET_FLAG_MASKS: i32 = 1 << 3;

/// Failure of a remote request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request could not be completed
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote has no such entity
    #[error("not found")]
    NotFound,

    /// The request was cancelled before a response arrived
    #[error("request cancelled")]
    Cancelled,
}

/// Remote addressing of a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputCollection {
    /// By id and access credential
    Id {
        /// Collection id
        id: i64,
        /// Access credential
        access_hash: i64,
    },
    /// By short name
    ShortName(String),
}

impl From<&Reference> for InputCollection {
    fn from(reference: &Reference) -> Self {
        match reference {
            Reference::Id { id, access_hash } => InputCollection::Id {
                id: *id,
                access_hash: *access_hash,
            },
            Reference::Name(name) => InputCollection::ShortName(name.clone()),
        }
    }
}

/// Collection metadata as sent by the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiStickerSet {
    /// Set flags; see [`STICKER_SET_FLAG_MASKS`]
    pub flags: i32,
    /// Collection id
    pub id: i64,
    /// Access credential
    pub access_hash: i64,
    /// Display title
    pub title: String,
    /// Short name
    pub short_name: String,
    /// Item count
    pub count: i32,
    /// Content hash
    pub hash: i32,
}

impl ApiStickerSet {
    /// Namespace the set belongs in
    pub fn namespace(&self) -> i32 {
        if self.flags & STICKER_SET_FLAG_MASKS != 0 {
            namespaces::item_collection::CLOUD_MASK_PACKS
        } else {
            namespaces::item_collection::CLOUD_STICKER_PACKS
        }
    }

    /// Stored form of the metadata
    pub fn to_info(&self) -> CollectionInfo {
        CollectionInfo {
            id: CollectionId::new(self.namespace(), self.id),
            access_hash: self.access_hash,
            title: self.title.clone(),
            short_name: self.short_name.clone(),
            hash: self.hash,
            count: self.count,
        }
    }
}

/// Label group: one label text and the documents carrying it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiStickerPack {
    /// Label text
    pub emoticon: String,
    /// Ids of the documents carrying the label
    pub documents: Vec<i64>,
}

/// Document as sent by the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiDocument {
    /// A usable document
    Document {
        /// Document id
        id: i64,
        /// Access credential
        access_hash: i64,
        /// MIME type
        mime_type: String,
        /// Size in bytes
        size: i32,
        /// File name attribute, when present
        file_name: Option<String>,
    },
    /// Placeholder for a document that no longer exists
    Empty {
        /// Document id
        id: i64,
    },
}

impl ApiDocument {
    /// Stored form of the document; `None` for placeholders
    pub fn to_media_file(&self) -> Option<MediaFile> {
        match self {
            ApiDocument::Document {
                id,
                mime_type,
                size,
                file_name,
                ..
            } => Some(MediaFile {
                id: MediaId::new(namespaces::media::CLOUD_FILE, *id),
                mime_type: mime_type.clone(),
                size: Some(*size),
                file_name: file_name.clone(),
            }),
            ApiDocument::Empty { .. } => None,
        }
    }
}

/// Response to a collection request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionResponse {
    /// Collection metadata
    pub set: ApiStickerSet,
    /// Label groups
    pub packs: Vec<ApiStickerPack>,
    /// Documents in collection order
    pub documents: Vec<ApiDocument>,
}

impl CollectionResponse {
    /// Decode into stored metadata and items.
    ///
    /// Labels are attached by document id. Documents that cannot be
    /// converted are skipped and take no ordinal.
    pub fn decode(&self) -> (CollectionInfo, Vec<Item>) {
        let mut labels_by_file: FxHashMap<MediaId, Vec<LabelKey>> = FxHashMap::default();
        for pack in &self.packs {
            let key = LabelKey::from(pack.emoticon.as_str());
            for &document in &pack.documents {
                labels_by_file
                    .entry(MediaId::new(namespaces::media::CLOUD_FILE, document))
                    .or_default()
                    .push(key.clone());
            }
        }

        let mut items = Vec::with_capacity(self.documents.len());
        for document in &self.documents {
            let Some(file) = document.to_media_file() else {
                continue;
            };
            let labels = labels_by_file.get(&file.id).cloned().unwrap_or_default();
            items.push(Item {
                index: ItemIndex::new(items.len() as i32, file.id.id),
                file,
                labels,
            });
        }
        (self.set.to_info(), items)
    }
}

/// Location of one stored photo size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiFileLocation {
    /// Datacenter holding the file
    pub dc_id: i32,
    /// Volume id
    pub volume_id: i64,
    /// Local id within the volume
    pub local_id: i32,
    /// Access secret
    pub secret: i64,
}

/// Profile photo as sent by the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiUserProfilePhoto {
    /// Small and big sizes of the photo
    Photo {
        /// 80x80 size
        small: ApiFileLocation,
        /// 640x640 size
        big: ApiFileLocation,
    },
    /// No photo
    Empty,
}

/// Stored sizes of a profile photo
pub fn parse_profile_photo(photo: Option<&ApiUserProfilePhoto>) -> Vec<ImageRepresentation> {
    let Some(ApiUserProfilePhoto::Photo { small, big }) = photo else {
        return Vec::new();
    };
    let representation = |side: i32, location: &ApiFileLocation| ImageRepresentation {
        width: side,
        height: side,
        datacenter_id: location.dc_id,
        volume_id: location.volume_id,
        local_id: location.local_id,
        secret: location.secret,
    };
    vec![representation(80, small), representation(640, big)]
}

/// User as sent by the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiUser {
    /// A full or partial profile
    User {
        /// Raw wire flags
        flags: i32,
        /// User id
        id: i32,
        /// Access credential; present only on authoritative updates
        access_hash: Option<i64>,
        /// First name
        first_name: Option<String>,
        /// Last name
        last_name: Option<String>,
        /// Address name
        username: Option<String>,
        /// Phone number
        phone: Option<String>,
        /// Profile photo
        photo: Option<ApiUserProfilePhoto>,
        /// Inline query placeholder, for bots
        bot_inline_placeholder: Option<String>,
    },
    /// A deleted or inaccessible user
    Empty {
        /// User id
        id: i32,
    },
}

impl ApiUser {
    /// Stored id of the user
    pub fn peer_id(&self) -> PeerId {
        let id = match self {
            ApiUser::User { id, .. } | ApiUser::Empty { id } => *id,
        };
        PeerId::new(namespaces::peer::CLOUD_USER, id)
    }

    /// Access credential of an authoritative update. A zero hash is no
    /// credential.
    pub fn credential(&self) -> Option<NonZeroI64> {
        match self {
            ApiUser::User { access_hash, .. } => access_hash.and_then(NonZeroI64::new),
            ApiUser::Empty { .. } => None,
        }
    }

    /// Build a record from this update alone
    pub fn to_user(&self) -> User {
        match self {
            ApiUser::User {
                flags,
                first_name,
                last_name,
                username,
                phone,
                photo,
                bot_inline_placeholder,
                ..
            } => {
                let (flags, bot_info) = parse_user_flags(*flags, bot_inline_placeholder.clone());
                User {
                    id: self.peer_id(),
                    access_hash: self.credential(),
                    first_name: first_name.clone(),
                    last_name: last_name.clone(),
                    username: username.clone(),
                    phone: phone.clone(),
                    photo: parse_profile_photo(photo.as_ref()),
                    bot_info,
                    flags,
                }
            }
            ApiUser::Empty { .. } => User::empty(self.peer_id()),
        }
    }
}

/// Remote service consumed by the engine.
///
/// Each request is a lazy signal: nothing is sent until it is started, and
/// disposing the subscription cancels the request.
pub trait RemoteService: Send + Sync {
    /// Fetch a collection with its label groups and documents.
    ///
    /// `None` is a successful answer that carries no collection.
    fn get_collection(
        &self,
        input: InputCollection,
    ) -> Signal<Option<CollectionResponse>, RemoteError>;

    /// Fetch users by id
    fn get_users(&self, ids: Vec<i32>) -> Signal<Vec<ApiUser>, RemoteError>;
}

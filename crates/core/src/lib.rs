//! Core types for Stockpile
//!
//! This crate defines the data model shared by every layer:
//! - CollectionId, MediaId, PeerId: namespaced identifiers
//! - CollectionInfo, Item, MediaFile: item collections and their members
//! - Reference: caller-supplied collection address
//! - LoadState: states published by the collection loader
//! - User, BotInfo, flag sets: profile records and their wire flag layout
//! - ImageCorner, ImageCorners: corner shapes for rendered thumbnails
//! - Error: store-level error type
//!
//! Every persisted type implements [`stockpile_codec::Coding`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod corners;
pub mod error;
pub mod types;
pub mod user;

pub use collection::{CollectionInfo, Item, LoadState, MediaFile, Reference};
pub use corners::{ImageCorner, ImageCorners, Insets, Size};
pub use error::{Error, Result, StoreError};
pub use types::{namespaces, CollectionId, ItemIndex, LabelKey, MediaId, PeerId};
pub use user::{
    parse_user_flags, BotInfo, BotUserInfoFlags, ImageRepresentation, User, UserInfoFlags,
};

//! Engine for Stockpile
//!
//! This crate orchestrates the lower layers:
//! - Loader: fetch-or-cache collection loading as a signal of load states
//! - Merge: reconciling partial and authoritative remote user updates
//! - Installer and peers: the only writers of collections and user records
//! - Remote: the service interface the engine consumes
//! - Config: `stockpile.toml`
//!
//! [`Stockpile`] is the entry point that ties a store, a remote service and
//! a scheduler together.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod installer;
pub mod loader;
pub mod merge;
pub mod peers;
pub mod remote;
mod stockpile;

pub use config::{ConfigError, ConfigResult, StockpileConfig, CONFIG_FILE_NAME};
pub use installer::Installer;
pub use loader::{load_collection, try_load_collection};
pub use merge::merge_user;
pub use peers::Peers;
pub use remote::{
    parse_profile_photo, ApiDocument, ApiFileLocation, ApiStickerPack, ApiStickerSet, ApiUser,
    ApiUserProfilePhoto, CollectionResponse, InputCollection, RemoteError, RemoteService,
    STICKER_SET_FLAG_MASKS,
};
pub use stockpile::Stockpile;
pub use stockpile_core::StoreError;

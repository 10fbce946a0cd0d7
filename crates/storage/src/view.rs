//! Live view types
//!
//! A combined view watches a set of keys. Subscribers receive one
//! `CombinedView` right away and another after every commit that touches
//! any watched key; several keys changed by one commit arrive together.

use rustc_hash::FxHashMap;
use stockpile_core::{CollectionId, CollectionInfo, Item, PeerId, User};
use tracing::warn;

use crate::tables::Tables;

/// Key a live view can watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewKey {
    /// Metadata of one collection
    CollectionInfo(CollectionId),
    /// Items of one collection
    CollectionItems(CollectionId),
    /// One peer record
    Peer(PeerId),
}

/// Current value behind a [`ViewKey`]
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// Collection metadata, if stored
    CollectionInfo(Option<CollectionInfo>),
    /// Collection items in ordinal order
    CollectionItems(Vec<Item>),
    /// Peer record, if stored
    Peer(Option<User>),
}

/// Values of every watched key as of one commit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombinedView {
    version: u64,
    views: FxHashMap<ViewKey, View>,
}

impl CombinedView {
    /// Build the view of `keys` over `tables`.
    ///
    /// A record that fails to decode reads as absent.
    pub(crate) fn build(version: u64, keys: &[ViewKey], tables: &Tables) -> Self {
        let mut views = FxHashMap::default();
        for key in keys {
            let view = match *key {
                ViewKey::CollectionInfo(id) => View::CollectionInfo(tables.info(id).unwrap_or_else(|e| {
                    warn!(target: "stockpile::view", collection = %id, error = %e, "undecodable collection info");
                    None
                })),
                ViewKey::CollectionItems(id) => View::CollectionItems(tables.items(id).unwrap_or_else(|e| {
                    warn!(target: "stockpile::view", collection = %id, error = %e, "undecodable collection items");
                    Vec::new()
                })),
                ViewKey::Peer(id) => View::Peer(tables.peer(id).unwrap_or_else(|e| {
                    warn!(target: "stockpile::view", peer = %id, error = %e, "undecodable peer");
                    None
                })),
            };
            views.insert(*key, view);
        }
        Self { version, views }
    }

    /// Store version the view was built from
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Value behind `key`, if it is watched
    pub fn get(&self, key: &ViewKey) -> Option<&View> {
        self.views.get(key)
    }

    /// Stored collection info
    pub fn info(&self, id: CollectionId) -> Option<&CollectionInfo> {
        match self.views.get(&ViewKey::CollectionInfo(id)) {
            Some(View::CollectionInfo(info)) => info.as_ref(),
            _ => None,
        }
    }

    /// Stored collection items; empty when unwatched or absent
    pub fn items(&self, id: CollectionId) -> &[Item] {
        match self.views.get(&ViewKey::CollectionItems(id)) {
            Some(View::CollectionItems(items)) => items,
            _ => &[],
        }
    }

    /// Stored peer record
    pub fn peer(&self, id: PeerId) -> Option<&User> {
        match self.views.get(&ViewKey::Peer(id)) {
            Some(View::Peer(user)) => user.as_ref(),
            _ => None,
        }
    }
}

//! Scoped store transactions
//!
//! A transaction reads one snapshot plus its own writes. Writes go to a
//! private copy of the snapshot made on the first write; the store
//! publishes that copy on commit.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use stockpile_core::{CollectionId, CollectionInfo, Item, LabelKey, PeerId, Result, User};

use crate::tables::Tables;
use crate::view::ViewKey;

/// Read/write access to the store, valid inside one transaction closure
pub struct Transaction {
    base: Arc<Tables>,
    working: Option<Tables>,
    touched: FxHashSet<ViewKey>,
}

impl Transaction {
    pub(crate) fn new(base: Arc<Tables>) -> Self {
        Self {
            base,
            working: None,
            touched: FxHashSet::default(),
        }
    }

    fn tables(&self) -> &Tables {
        self.working.as_ref().unwrap_or(&self.base)
    }

    fn tables_mut(&mut self) -> &mut Tables {
        let base = &self.base;
        self.working.get_or_insert_with(|| Tables::clone(base))
    }

    /// Stored metadata of a collection
    pub fn get_info(&self, id: CollectionId) -> Result<Option<CollectionInfo>> {
        self.tables().info(id)
    }

    /// Stored items of a collection in ordinal order
    pub fn get_items(&self, id: CollectionId) -> Result<Vec<Item>> {
        self.tables().items(id)
    }

    /// Stored peer record
    pub fn get_peer(&self, id: PeerId) -> Result<Option<User>> {
        self.tables().peer(id)
    }

    /// Stored items carrying `label`, across all collections
    pub fn items_with_label(&self, label: &LabelKey) -> Result<Vec<Item>> {
        self.tables().items_with_label(label)
    }

    /// Whether a collection is stored
    pub fn contains_collection(&self, id: CollectionId) -> bool {
        self.tables().contains_collection(id)
    }

    /// Store a collection, replacing any previous info and items
    pub fn put_collection(&mut self, info: &CollectionInfo, items: &[Item]) {
        self.tables_mut().put_collection(info, items);
        self.touched.insert(ViewKey::CollectionInfo(info.id));
        self.touched.insert(ViewKey::CollectionItems(info.id));
    }

    /// Remove a collection. Returns whether it was stored.
    pub fn remove_collection(&mut self, id: CollectionId) -> bool {
        if !self.tables().holds_collection_data(id) {
            return false;
        }
        self.tables_mut().remove_collection(id);
        self.touched.insert(ViewKey::CollectionInfo(id));
        self.touched.insert(ViewKey::CollectionItems(id));
        true
    }

    /// Store a peer record, replacing any previous one
    pub fn put_peer(&mut self, user: &User) {
        self.tables_mut().put_peer(user);
        self.touched.insert(ViewKey::Peer(user.id));
    }

    /// Whether anything was written
    pub fn has_writes(&self) -> bool {
        self.working.is_some()
    }

    pub(crate) fn into_parts(self) -> (Option<Tables>, FxHashSet<ViewKey>) {
        (self.working, self.touched)
    }
}

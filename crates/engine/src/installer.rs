//! Installer: persisting collections in the local store
//!
//! ## Design
//!
//! `Installer` is a stateless facade over the store. It holds nothing
//! beyond a `Store` handle, so any number of installers may share one
//! store.
//!
//! Installation is the only path that writes collections. A loader that
//! follows an installed id sees `installed: true` on its next emission.
//!
//! - `install(info, items)` - store a collection, replacing any previous items
//! - `uninstall(id)` - remove a collection
//! - `search(label)` - stored items carrying a label

use stockpile_core::{CollectionId, CollectionInfo, Item, LabelKey, Result};
use stockpile_storage::Store;
use tracing::info;

/// Writes and removes collections
#[derive(Clone)]
pub struct Installer {
    store: Store,
}

impl Installer {
    /// Create an installer over `store`
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Store a collection with its items in one transaction.
    ///
    /// Items previously stored under the same id are replaced.
    pub fn install(&self, info: &CollectionInfo, items: &[Item]) -> Result<()> {
        self.store.transaction(|txn| {
            txn.put_collection(info, items);
            Ok(())
        })?;
        info!(
            target: "stockpile::txn",
            collection = %info.id,
            items = items.len(),
            "collection installed"
        );
        Ok(())
    }

    /// Remove a collection.
    ///
    /// Returns `true` if anything was stored under `id`.
    pub fn uninstall(&self, id: CollectionId) -> Result<bool> {
        let removed = self.store.transaction(|txn| Ok(txn.remove_collection(id)))?;
        if removed {
            info!(target: "stockpile::txn", collection = %id, "collection uninstalled");
        }
        Ok(removed)
    }

    /// Stored items carrying `label`, across every installed collection
    pub fn search(&self, label: &LabelKey) -> Result<Vec<Item>> {
        self.store.transaction(|txn| txn.items_with_label(label))
    }
}

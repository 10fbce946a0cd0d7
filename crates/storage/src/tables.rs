//! Committed store state
//!
//! `Tables` is one immutable snapshot of everything the store holds. Records
//! are kept in their encoded form and decoded on read. A write transaction
//! clones the snapshot on its first write and publishes the clone on commit;
//! readers holding the previous `Arc<Tables>` are unaffected.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;
use stockpile_codec::{decode_from_slice, encode_to_vec};
use stockpile_core::{CollectionId, CollectionInfo, Item, ItemIndex, LabelKey, PeerId, Result, User};

/// One consistent state of the store
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    infos: BTreeMap<CollectionId, Vec<u8>>,
    items: BTreeMap<CollectionId, BTreeMap<ItemIndex, Vec<u8>>>,
    peers: FxHashMap<PeerId, Vec<u8>>,
    /// Secondary index: label key → items carrying it
    labels: FxHashMap<LabelKey, BTreeSet<(CollectionId, ItemIndex)>>,
}

impl Tables {
    pub(crate) fn info(&self, id: CollectionId) -> Result<Option<CollectionInfo>> {
        match self.infos.get(&id) {
            Some(bytes) => Ok(Some(decode_from_slice(bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn items(&self, id: CollectionId) -> Result<Vec<Item>> {
        let Some(items) = self.items.get(&id) else {
            return Ok(Vec::new());
        };
        items
            .values()
            .map(|bytes| decode_from_slice(bytes).map_err(Into::into))
            .collect()
    }

    pub(crate) fn peer(&self, id: PeerId) -> Result<Option<User>> {
        match self.peers.get(&id) {
            Some(bytes) => Ok(Some(decode_from_slice(bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn items_with_label(&self, label: &LabelKey) -> Result<Vec<Item>> {
        let Some(entries) = self.labels.get(label) else {
            return Ok(Vec::new());
        };
        let mut found = Vec::with_capacity(entries.len());
        for (collection, index) in entries {
            if let Some(bytes) = self.items.get(collection).and_then(|items| items.get(index)) {
                found.push(decode_from_slice(bytes)?);
            }
        }
        Ok(found)
    }

    pub(crate) fn contains_collection(&self, id: CollectionId) -> bool {
        self.infos.contains_key(&id)
    }

    /// Whether any info or item record exists for `id`
    pub(crate) fn holds_collection_data(&self, id: CollectionId) -> bool {
        self.infos.contains_key(&id) || self.items.contains_key(&id)
    }

    pub(crate) fn collection_count(&self) -> usize {
        self.infos.len()
    }

    pub(crate) fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Replace a collection's info and items
    pub(crate) fn put_collection(&mut self, info: &CollectionInfo, items: &[Item]) {
        let id = info.id;
        self.remove_items(id);
        self.infos.insert(id, encode_to_vec(info));

        let mut encoded = BTreeMap::new();
        for item in items {
            for label in &item.labels {
                self.labels
                    .entry(label.clone())
                    .or_default()
                    .insert((id, item.index));
            }
            encoded.insert(item.index, encode_to_vec(item));
        }
        self.items.insert(id, encoded);
    }

    /// Remove a collection. Returns whether it existed.
    pub(crate) fn remove_collection(&mut self, id: CollectionId) -> bool {
        let had_items = self.remove_items(id);
        self.infos.remove(&id).is_some() || had_items
    }

    pub(crate) fn put_peer(&mut self, user: &User) {
        self.peers.insert(user.id, encode_to_vec(user));
    }

    fn remove_items(&mut self, id: CollectionId) -> bool {
        let Some(previous) = self.items.remove(&id) else {
            return false;
        };
        for (index, bytes) in &previous {
            // Labels come from the stored record; an undecodable record has no index entries to clear
            let Ok(item) = decode_from_slice::<Item>(bytes) else {
                continue;
            };
            for label in &item.labels {
                if let Some(entries) = self.labels.get_mut(label) {
                    entries.remove(&(id, *index));
                    if entries.is_empty() {
                        self.labels.remove(label);
                    }
                }
            }
        }
        true
    }
}

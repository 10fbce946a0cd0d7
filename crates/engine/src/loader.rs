//! Fetch-or-cache collection loading
//!
//! # Algorithm
//!
//! 1. In one transaction, resolve a by-id reference against the local store,
//!    probing sticker packs before mask packs. By-name references are not
//!    probed.
//! 2. Found locally: follow the live view of the stored info and items.
//! 3. Not found: request the collection from the remote. A failed or empty
//!    response ends the load with `Empty`. Otherwise decode it and follow
//!    the live view of the resolved id, publishing the fetched items.
//! 4. Every load starts with `Fetching`, including loads that end because
//!    the store is unavailable.
//!
//! Loading never writes to the store. `installed` reports whether some
//! other writer (the installer) has stored the collection.

use std::sync::Arc;

use stockpile_core::{
    namespaces, CollectionId, CollectionInfo, Item, LoadState, Reference, StoreError,
};
use stockpile_signal::{NoError, Signal};
use stockpile_storage::{Store, Transaction, ViewKey};
use tracing::{debug, error};

use crate::remote::{InputCollection, RemoteService};

/// Load a collection, publishing load states.
///
/// Store failures are logged and published as `Empty`; use
/// [`try_load_collection`] to observe them.
pub fn load_collection(
    store: &Store,
    remote: Arc<dyn RemoteService>,
    reference: Reference,
) -> Signal<LoadState, NoError> {
    try_load_collection(store, remote, reference).catch(|e: StoreError| {
        error!(target: "stockpile::load", error = %e, "store unavailable, collection load ends empty");
        Signal::single(LoadState::Empty)
    })
}

/// Load a collection, failing the signal when the store is unavailable.
///
/// `Fetching` is published before the store is consulted, so a failure
/// arrives after it.
pub fn try_load_collection(
    store: &Store,
    remote: Arc<dyn RemoteService>,
    reference: Reference,
) -> Signal<LoadState, StoreError> {
    let view_store = store.clone();
    let lookup = store
        .transaction_signal(move |txn| {
            let pipeline = match find_local(txn, &reference)? {
                Some((info, items)) => {
                    debug!(target: "stockpile::load", collection = %info.id, "collection found locally");
                    follow_local(&view_store, info, items)
                }
                None => {
                    debug!(target: "stockpile::load", ?reference, "collection not stored, fetching");
                    fetch_remote(&view_store, Arc::clone(&remote), &reference)
                }
            };
            Ok(pipeline.cast_error::<StoreError>())
        })
        .switch_to_latest();
    // Fetching goes out before the transaction so store failures still follow it
    Signal::<LoadState, NoError>::single(LoadState::Fetching)
        .cast_error::<StoreError>()
        .then(lookup)
}

/// Stored info and items for a by-id reference, probing namespaces in priority order
fn find_local(
    txn: &Transaction,
    reference: &Reference,
) -> Result<Option<(CollectionInfo, Vec<Item>)>, StoreError> {
    let Reference::Id { id, .. } = reference else {
        return Ok(None);
    };
    for namespace in namespaces::item_collection::PROBE_ORDER {
        let collection = CollectionId::new(namespace, *id);
        if let Some(info) = txn.get_info(collection)? {
            let items = txn.get_items(collection)?;
            return Ok(Some((info, items)));
        }
    }
    Ok(None)
}

fn follow_local(store: &Store, info: CollectionInfo, items: Vec<Item>) -> Signal<LoadState, NoError> {
    let id = info.id;
    store
        .combined_view(vec![ViewKey::CollectionInfo(id), ViewKey::CollectionItems(id)])
        .map(move |view| match view.info(id) {
            Some(stored) => LoadState::Result {
                info: stored.clone(),
                items: view.items(id).to_vec(),
                installed: true,
            },
            // Removed since the lookup: keep publishing what was found
            None => LoadState::Result {
                info: info.clone(),
                items: items.clone(),
                installed: false,
            },
        })
}

fn fetch_remote(
    store: &Store,
    remote: Arc<dyn RemoteService>,
    reference: &Reference,
) -> Signal<LoadState, NoError> {
    let store = store.clone();
    remote
        .get_collection(InputCollection::from(reference))
        .catch(|e| {
            debug!(target: "stockpile::load", error = %e, "collection request failed");
            Signal::single(None)
        })
        .map_to_signal(move |response| {
            let Some(response) = response else {
                return Signal::single(LoadState::Empty);
            };
            let (info, items) = response.decode();
            let id = info.id;
            debug!(target: "stockpile::load", collection = %id, items = items.len(), "collection fetched");
            store
                .combined_view(vec![ViewKey::CollectionInfo(id)])
                .map(move |view| match view.info(id) {
                    Some(stored) => LoadState::Result {
                        info: stored.clone(),
                        items: items.clone(),
                        installed: true,
                    },
                    None => LoadState::Result {
                        info: info.clone(),
                        items: items.clone(),
                        installed: false,
                    },
                })
        })
}

//! Peer records: applying remote user updates to the store

use stockpile_core::{PeerId, Result, StoreError, User};
use stockpile_signal::{NoError, Signal};
use stockpile_storage::{Store, Transaction};
use tracing::{debug, error};

use crate::merge::merge_user;
use crate::remote::{ApiUser, RemoteService};

/// Reads and merges stored peer records
#[derive(Clone)]
pub struct Peers {
    store: Store,
}

impl Peers {
    /// Create a peer facade over `store`
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Stored record for `id`
    pub fn get(&self, id: PeerId) -> Result<Option<User>> {
        self.store.transaction(|txn| txn.get_peer(id))
    }

    /// Merge each remote user with its stored record and persist the result.
    ///
    /// All users are applied in one transaction; a later user in `users`
    /// merges against the record an earlier one produced. Returns the
    /// stored records in input order.
    pub fn apply_remote_users(&self, users: &[ApiUser]) -> Result<Vec<User>> {
        if users.is_empty() {
            return Ok(Vec::new());
        }
        let merged = self.store.transaction(|txn| merge_into(txn, users))?;
        debug!(target: "stockpile::merge", users = merged.len(), "remote users applied");
        Ok(merged)
    }

    /// Request `ids` from the remote and apply the answer.
    ///
    /// Emits the stored records once. A failed request or an unavailable
    /// store yields an empty list.
    pub fn refresh(&self, remote: &dyn RemoteService, ids: Vec<i32>) -> Signal<Vec<User>, NoError> {
        if ids.is_empty() {
            return Signal::single(Vec::new());
        }
        let store = self.store.clone();
        remote
            .get_users(ids)
            .catch(|e| {
                debug!(target: "stockpile::merge", error = %e, "user request failed");
                Signal::single(Vec::new())
            })
            .map_to_signal(move |users: Vec<ApiUser>| {
                store
                    .transaction_signal(move |txn| merge_into(txn, &users))
                    .catch(|e: StoreError| {
                        error!(target: "stockpile::merge", error = %e, "store unavailable, user update dropped");
                        Signal::single(Vec::new())
                    })
            })
    }
}

/// Read-merge-write every update inside `txn`
fn merge_into(txn: &mut Transaction, users: &[ApiUser]) -> Result<Vec<User>> {
    let mut merged = Vec::with_capacity(users.len());
    for update in users {
        let existing = txn.get_peer(update.peer_id())?;
        let user = merge_user(existing.as_ref(), update);
        txn.put_peer(&user);
        merged.push(user);
    }
    Ok(merged)
}

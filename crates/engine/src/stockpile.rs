//! Stockpile: the engine entry point
//!
//! Ties one store, one remote service and one scheduler together:
//! - Loading: `load_collection` / `try_load_collection`
//! - Installing: `install_collection`, `uninstall_collection`, `search_items`
//! - Peers: `apply_remote_users`, `refresh_users`
//!
//! Schedulers are always injected. [`Stockpile::with_config`] starts a
//! dedicated [`RefreshScheduler`] at the configured interval.

use std::path::Path;
use std::sync::Arc;

use stockpile_core::{
    CollectionId, CollectionInfo, Item, LabelKey, LoadState, PeerId, Reference, Result,
    StoreError, User,
};
use stockpile_signal::{NoError, RefreshScheduler, Scheduler, Signal, SignalSlot};
use stockpile_storage::Store;
use tracing::info;

use crate::config::{ConfigError, ConfigResult, StockpileConfig};
use crate::installer::Installer;
use crate::loader;
use crate::peers::Peers;
use crate::remote::{ApiUser, RemoteService};

/// Engine handle
///
/// Cloning is cheap; clones share the store, remote and scheduler.
///
/// # Example
///
/// ```ignore
/// let stockpile = Stockpile::with_config(&StockpileConfig::default(), remote)?;
/// let load = stockpile.load_collection(Reference::Name("cats".into()));
/// let handle = load.start_with_next(|state| println!("{:?}", state));
/// ```
#[derive(Clone)]
pub struct Stockpile {
    store: Store,
    remote: Arc<dyn RemoteService>,
    scheduler: Arc<dyn Scheduler>,
    installer: Installer,
    peers: Peers,
}

impl Stockpile {
    /// Assemble an engine from its collaborators
    pub fn new(store: Store, remote: Arc<dyn RemoteService>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            installer: Installer::new(store.clone()),
            peers: Peers::new(store.clone()),
            store,
            remote,
            scheduler,
        }
    }

    /// Build a fresh store and refresh scheduler from `config`.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` for out-of-range values, `ConfigError::Scheduler`
    /// if the scheduler thread cannot be started.
    pub fn with_config(config: &StockpileConfig, remote: Arc<dyn RemoteService>) -> ConfigResult<Self> {
        config.validate()?;
        let scheduler =
            RefreshScheduler::new(config.refresh_interval()).map_err(ConfigError::Scheduler)?;
        info!(
            target: "stockpile::scheduler",
            refresh_interval_ms = config.refresh_interval_ms,
            transaction_timeout_ms = config.transaction_timeout_ms,
            "stockpile started"
        );
        Ok(Self::new(
            Store::with_timeout(config.transaction_timeout()),
            remote,
            Arc::new(scheduler),
        ))
    }

    /// Load `stockpile.toml` from `path` (writing the defaults first if it is
    /// missing) and build an engine from it.
    pub fn from_config_file(path: &Path, remote: Arc<dyn RemoteService>) -> ConfigResult<Self> {
        StockpileConfig::write_default_if_missing(path)?;
        let config = StockpileConfig::from_file(path)?;
        Self::with_config(&config, remote)
    }

    /// The underlying store
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The scheduler values are applied through
    pub fn scheduler(&self) -> Arc<dyn Scheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Close the store. Later transactions fail.
    pub fn close(&self) {
        self.store.close();
    }

    // ========== Loading ==========

    /// Load a collection; store failures end the load with `Empty`
    pub fn load_collection(&self, reference: Reference) -> Signal<LoadState, NoError> {
        loader::load_collection(&self.store, Arc::clone(&self.remote), reference)
    }

    /// Load a collection; store failures fail the signal
    pub fn try_load_collection(&self, reference: Reference) -> Signal<LoadState, StoreError> {
        loader::try_load_collection(&self.store, Arc::clone(&self.remote), reference)
    }

    /// Slot following the load of `reference`, applied through the scheduler
    pub fn collection_slot(&self, reference: Reference) -> SignalSlot<LoadState> {
        let slot = SignalSlot::new(self.scheduler());
        slot.set_signal(self.load_collection(reference), || {});
        slot
    }

    // ========== Installing ==========

    /// Store a collection with its items
    pub fn install_collection(&self, info: &CollectionInfo, items: &[Item]) -> Result<()> {
        self.installer.install(info, items)
    }

    /// Remove a stored collection; returns whether it was stored
    pub fn uninstall_collection(&self, id: CollectionId) -> Result<bool> {
        self.installer.uninstall(id)
    }

    /// Stored items carrying `label`
    pub fn search_items(&self, label: &LabelKey) -> Result<Vec<Item>> {
        self.installer.search(label)
    }

    // ========== Peers ==========

    /// Stored record for a peer
    pub fn peer(&self, id: PeerId) -> Result<Option<User>> {
        self.peers.get(id)
    }

    /// Merge remote users into their stored records
    pub fn apply_remote_users(&self, users: &[ApiUser]) -> Result<Vec<User>> {
        self.peers.apply_remote_users(users)
    }

    /// Fetch users from the remote and merge them
    pub fn refresh_users(&self, ids: Vec<i32>) -> Signal<Vec<User>, NoError> {
        self.peers.refresh(self.remote.as_ref(), ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{CollectionResponse, InputCollection, RemoteError};
    use stockpile_core::namespaces;
    use stockpile_signal::ManualScheduler;
    use tempfile::TempDir;

    struct SilentRemote;

    impl RemoteService for SilentRemote {
        fn get_collection(
            &self,
            _input: InputCollection,
        ) -> Signal<Option<CollectionResponse>, RemoteError> {
            Signal::single(None)
        }

        fn get_users(&self, _ids: Vec<i32>) -> Signal<Vec<ApiUser>, RemoteError> {
            Signal::single(Vec::new())
        }
    }

    #[test]
    fn test_collection_slot_applies_on_frames() {
        let scheduler = Arc::new(ManualScheduler::new());
        let stockpile = Stockpile::new(Store::new(), Arc::new(SilentRemote), scheduler.clone());

        let slot = stockpile.collection_slot(Reference::Id {
            id: 42,
            access_hash: 0,
        });
        assert_eq!(slot.contents(), None);

        scheduler.advance_frame();
        assert_eq!(slot.contents(), Some(LoadState::Empty));
    }

    #[test]
    fn test_with_config_builds_working_engine() {
        let config = StockpileConfig {
            refresh_interval_ms: 5,
            transaction_timeout_ms: 20,
        };
        let stockpile = Stockpile::with_config(&config, Arc::new(SilentRemote)).unwrap();
        let id = CollectionId::new(namespaces::item_collection::CLOUD_STICKER_PACKS, 1);
        assert!(!stockpile.uninstall_collection(id).unwrap());
    }

    #[test]
    fn test_with_config_rejects_zero_interval() {
        let config = StockpileConfig {
            refresh_interval_ms: 0,
            transaction_timeout_ms: 20,
        };
        let err = Stockpile::with_config(&config, Arc::new(SilentRemote)).err().unwrap();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_config_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(crate::config::CONFIG_FILE_NAME);
        let stockpile = Stockpile::from_config_file(&path, Arc::new(SilentRemote)).unwrap();
        assert!(path.exists());
        assert!(!stockpile.store().is_closed());
    }

    #[test]
    fn test_close_rejects_writes() {
        let stockpile = Stockpile::new(
            Store::new(),
            Arc::new(SilentRemote),
            Arc::new(stockpile_signal::ImmediateScheduler),
        );
        stockpile.close();
        assert!(stockpile.apply_remote_users(&[ApiUser::Empty { id: 1 }]).is_err());
    }
}

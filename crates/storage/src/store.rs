//! Transactional store with live views
//!
//! # Commit protocol
//!
//! 1. Acquire the transaction lock (bounded wait, else `StoreUnavailable`)
//! 2. Run the closure against the current snapshot
//! 3. On success with writes: publish the new snapshot, bump the version,
//!    queue one notification per observer watching a touched key
//! 4. Release the transaction lock, then deliver queued notifications
//!
//! Notifications are delivered from a single FIFO queue, so every observer
//! sees commits in commit order. A commit made from inside a notification
//! callback is queued behind the notifications already pending.
//!
//! One thread drains the queue at a time and holds no store lock while a
//! callback runs. A commit made while another thread is draining returns
//! at once; the draining thread delivers its notifications.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use stockpile_core::{Error, Result};
use stockpile_signal::{ActionDisposable, Disposable, EmptyDisposable, NoError, Signal, Subscriber};
use tracing::{debug, warn};

use crate::tables::Tables;
use crate::transaction::Transaction;
use crate::view::{CombinedView, ViewKey};

/// Default bound on waiting for the transaction lock
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_millis(5000);

type ViewSubscriber = Arc<Subscriber<CombinedView, NoError>>;

struct Observer {
    keys: Vec<ViewKey>,
    subscriber: ViewSubscriber,
}

#[derive(Default)]
struct Observers {
    next_id: u64,
    entries: BTreeMap<u64, Observer>,
}

struct StoreInner {
    current: RwLock<Arc<Tables>>,
    txn_lock: Mutex<()>,
    closed: AtomicBool,
    version: AtomicU64,
    timeout: Duration,
    observers: Mutex<Observers>,
    pending: Mutex<VecDeque<(ViewSubscriber, CombinedView)>>,
    /// Set while some thread drains `pending`
    draining: AtomicBool,
}

/// Store snapshot statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Version of the latest commit (0 before any write)
    pub version: u64,
    /// Stored collections
    pub collections: usize,
    /// Stored peer records
    pub peers: usize,
    /// Registered live-view observers
    pub observers: usize,
}

/// Shared handle to the store
///
/// Cloning is cheap; every clone refers to the same store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("version", &self.version())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Store {
    /// Create an empty store with the default transaction timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TRANSACTION_TIMEOUT)
    }

    /// Create an empty store that waits at most `timeout` to open a transaction
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                current: RwLock::new(Arc::new(Tables::default())),
                txn_lock: Mutex::new(()),
                closed: AtomicBool::new(false),
                version: AtomicU64::new(0),
                timeout,
                observers: Mutex::new(Observers::default()),
                pending: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
            }),
        }
    }

    /// Version of the latest commit
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Refuse every later transaction with `Error::Closed`.
    ///
    /// Live views stay registered but receive no further updates.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            debug!(target: "stockpile::txn", version = self.version(), "store closed");
        }
    }

    /// Run `f` in a transaction.
    ///
    /// Writes are committed when `f` returns `Ok`; on `Err` they are
    /// discarded and the error is returned.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut Transaction) -> Result<R>) -> Result<R> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        let Some(guard) = self.inner.txn_lock.try_lock_for(self.inner.timeout) else {
            warn!(
                target: "stockpile::txn",
                timeout_ms = self.inner.timeout.as_millis() as u64,
                "transaction lock timeout"
            );
            return Err(Error::StoreUnavailable(format!(
                "transaction lock timeout after {}ms",
                self.inner.timeout.as_millis()
            )));
        };
        // close() may have won the race for the lock
        if self.is_closed() {
            return Err(Error::Closed);
        }

        let snapshot = self.inner.current.read().clone();
        let mut txn = Transaction::new(snapshot);
        let result = f(&mut txn);

        match result {
            Ok(value) => {
                let (working, touched) = txn.into_parts();
                if let Some(tables) = working {
                    self.commit(tables, &touched);
                }
                drop(guard);
                self.deliver_pending();
                Ok(value)
            }
            Err(e) => {
                debug!(target: "stockpile::txn", error = %e, "transaction aborted");
                Err(e)
            }
        }
    }

    /// Transaction lifted into a signal.
    ///
    /// Each start runs `f` in a transaction and emits its result, or fails
    /// with the transaction's error (`StoreUnavailable` when the store is
    /// busy past the timeout or closed).
    pub fn transaction_signal<R, F>(&self, f: F) -> Signal<R, Error>
    where
        R: Send + 'static,
        F: Fn(&mut Transaction) -> Result<R> + Send + Sync + 'static,
    {
        let store = self.clone();
        Signal::new(move |subscriber| {
            match store.transaction(|txn| f(txn)) {
                Ok(value) => {
                    subscriber.put_next(value);
                    subscriber.put_completion();
                }
                Err(Error::Closed) => {
                    subscriber.put_error(Error::StoreUnavailable("store closed".to_string()))
                }
                Err(e) => subscriber.put_error(e),
            }
            Arc::new(EmptyDisposable) as Arc<dyn Disposable>
        })
    }

    /// Live view of `keys`.
    ///
    /// Emits the current values when started, then once per commit touching
    /// any of the keys. Disposing the subscription unregisters the observer.
    pub fn combined_view(&self, keys: Vec<ViewKey>) -> Signal<CombinedView, NoError> {
        let store = self.clone();
        Signal::new(move |subscriber| {
            let id = {
                let mut observers = store.inner.observers.lock();
                let id = observers.next_id;
                observers.next_id += 1;

                let tables = store.inner.current.read().clone();
                let initial = CombinedView::build(store.version(), &keys, &tables);
                store.inner.pending.lock().push_back((Arc::clone(&subscriber), initial));

                observers.entries.insert(
                    id,
                    Observer {
                        keys: keys.clone(),
                        subscriber,
                    },
                );
                id
            };
            debug!(target: "stockpile::view", observer = id, keys = keys.len(), "view registered");
            store.deliver_pending();

            let weak = Arc::downgrade(&store.inner);
            Arc::new(ActionDisposable::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.observers.lock().entries.remove(&id);
                    debug!(target: "stockpile::view", observer = id, "view unregistered");
                }
            })) as Arc<dyn Disposable>
        })
    }

    /// Return a snapshot of store statistics.
    pub fn stats(&self) -> StoreStats {
        let tables = self.inner.current.read().clone();
        StoreStats {
            version: self.version(),
            collections: tables.collection_count(),
            peers: tables.peer_count(),
            observers: self.inner.observers.lock().entries.len(),
        }
    }

    /// Publish `tables` and queue view notifications. Caller holds the transaction lock.
    fn commit(&self, tables: Tables, touched: &rustc_hash::FxHashSet<ViewKey>) {
        let tables = Arc::new(tables);
        let observers = self.inner.observers.lock();
        *self.inner.current.write() = Arc::clone(&tables);
        let version = self.inner.version.fetch_add(1, Ordering::AcqRel) + 1;

        let mut notified = 0usize;
        let mut pending = self.inner.pending.lock();
        for observer in observers.entries.values() {
            if observer.keys.iter().any(|key| touched.contains(key)) {
                let view = CombinedView::build(version, &observer.keys, &tables);
                pending.push_back((Arc::clone(&observer.subscriber), view));
                notified += 1;
            }
        }
        debug!(
            target: "stockpile::txn",
            version,
            touched = touched.len(),
            notified,
            "transaction committed"
        );
    }

    /// Deliver queued notifications in FIFO order.
    ///
    /// A drain already running (on this thread, from a callback that commits
    /// or starts a view, or on another thread) picks up the new entries itself.
    fn deliver_pending(&self) {
        loop {
            if self
                .inner
                .draining
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }
            {
                let _drain = DrainFlag(&self.inner.draining);
                loop {
                    let next = self.inner.pending.lock().pop_front();
                    let Some((subscriber, view)) = next else {
                        break;
                    };
                    subscriber.put_next(view);
                }
            }
            // Entries queued after the last pop but before the flag cleared
            if self.inner.pending.lock().is_empty() {
                return;
            }
        }
    }
}

/// Clears the drain flag when the drain ends, including by unwinding
struct DrainFlag<'a>(&'a AtomicBool);

impl Drop for DrainFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

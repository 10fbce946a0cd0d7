//! Stockpile - fetch-or-cache loading of installable item collections
//!
//! Stockpile resolves a collection reference against a local transactional
//! store, falls back to a remote service when nothing is stored, and
//! publishes the outcome as a lazy, cancellable signal of load states.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use stockpile::{Reference, Stockpile, StockpileConfig};
//!
//! let stockpile = Stockpile::with_config(&StockpileConfig::default(), Arc::new(remote))?;
//!
//! // Fetching, then a Result (or Empty)
//! let handle = stockpile
//!     .load_collection(Reference::Name("cats".into()))
//!     .start_with_next(|state| println!("{:?}", state));
//!
//! // Stops remote work and live-view delivery
//! handle.dispose();
//! ```
//!
//! # Architecture
//!
//! - `stockpile-codec`: key-tagged binary records
//! - `stockpile-core`: data model and store errors
//! - `stockpile-signal`: signals, disposables and frame schedulers
//! - `stockpile-storage`: copy-on-write store with live views
//! - `stockpile-engine`: loader, merge, installer and the [`Stockpile`] entry point

pub use stockpile_codec::{
    decode_from_slice, encode_to_vec, Coding, CodecError, Decoder, Encoder, FieldState,
};
pub use stockpile_core::*;
pub use stockpile_engine::*;
pub use stockpile_signal::{
    ActionDisposable, Disposable, EmptyDisposable, FrameQueue, ImmediateScheduler,
    ManualScheduler, MetaDisposable, NoError, RefreshScheduler, Scheduler, SchedulerStats, Signal,
    SignalSlot, Subscriber,
};
pub use stockpile_storage::{CombinedView, Store, StoreStats, Transaction, View, ViewKey};

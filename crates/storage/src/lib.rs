//! Storage layer for Stockpile
//!
//! This crate implements the transactional store the loader runs against:
//! - Store: serialized transactions over copy-on-write snapshots
//! - Transaction: scoped reads and writes of collections and peers
//! - Label index: secondary lookup of items by label key
//! - Live views: `combined_view` signals re-emitting on every relevant commit
//! - Version management with AtomicU64
//!
//! Records are held in their encoded form (see `stockpile-codec`).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod store;
mod tables;
pub mod transaction;
pub mod view;

pub use store::{Store, StoreStats, DEFAULT_TRANSACTION_TIMEOUT};
pub use transaction::Transaction;
pub use view::{CombinedView, View, ViewKey};

pub use stockpile_core::{Error as StoreError, Result};

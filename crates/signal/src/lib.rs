//! Signals and scheduling for Stockpile
//!
//! This crate provides the reactive plumbing the loader is built on:
//! - Disposable, MetaDisposable: cancellation handles and the single-slot token
//! - Subscriber: synchronized delivery endpoint of a started signal
//! - Signal: lazy producer with `map`, `map_to_signal`, `switch_to_latest`,
//!   `then`, `catch` and `deliver_on`
//! - Scheduler: FrameQueue, ManualScheduler, RefreshScheduler, ImmediateScheduler
//! - SignalSlot: holder of the latest value of a signal
//!
//! # Delivery Guarantees
//!
//! - Values arrive in the order combinators compose them
//! - After `dispose()` returns, the subscriber receives nothing more
//! - At most one terminal event (error or completion) is delivered

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod combinators;
pub mod disposable;
pub mod scheduler;
pub mod signal;
pub mod slot;
pub mod subscriber;

pub use disposable::{ActionDisposable, Disposable, EmptyDisposable, MetaDisposable};
pub use scheduler::{
    FrameQueue, ImmediateScheduler, ManualScheduler, RefreshScheduler, Scheduler, SchedulerStats,
    Work, DEFAULT_REFRESH_INTERVAL,
};
pub use signal::{NoError, Signal};
pub use slot::SignalSlot;
pub use subscriber::Subscriber;

//! Cancellation handles
//!
//! Every started signal hands back a [`Disposable`]. Disposing it stops
//! delivery and releases whatever the producer holds (a pending request, a
//! store observer). Disposal is idempotent on every implementation here.

use std::sync::Arc;

use parking_lot::Mutex;

/// Cancellation handle
pub trait Disposable: Send + Sync {
    /// Cancel. Calling this more than once has no further effect.
    fn dispose(&self);
}

/// Handle with nothing to cancel
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyDisposable;

impl Disposable for EmptyDisposable {
    fn dispose(&self) {}
}

type Action = Box<dyn FnOnce() + Send>;

/// Runs an action on first disposal
pub struct ActionDisposable {
    action: Mutex<Option<Action>>,
}

impl ActionDisposable {
    /// Wrap an action
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Mutex::new(Some(Box::new(action))),
        }
    }
}

impl Disposable for ActionDisposable {
    fn dispose(&self) {
        // Take under the lock, run outside it: the action may re-enter
        let action = self.action.lock().take();
        if let Some(action) = action {
            action();
        }
    }
}

#[derive(Default)]
struct MetaState {
    current: Option<Arc<dyn Disposable>>,
    disposed: bool,
}

/// Single-slot cancellation token.
///
/// Holds at most one live disposable. Replacing it disposes the previous
/// occupant; disposing the token disposes the occupant and makes every
/// later `set` dispose its argument immediately.
///
/// # Example
///
/// ```ignore
/// let token = MetaDisposable::new();
/// token.set(Some(signal_a.start(...)));
/// token.set(Some(signal_b.start(...))); // signal_a's subscription is disposed
/// token.set(None);                      // signal_b's subscription is disposed
/// ```
#[derive(Default)]
pub struct MetaDisposable {
    state: Mutex<MetaState>,
}

impl MetaDisposable {
    /// Create an empty token
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the occupant, disposing the previous one.
    ///
    /// The swap happens under the lock; the previous occupant is disposed
    /// after the lock is released so it may re-enter this token.
    pub fn set(&self, next: Option<Arc<dyn Disposable>>) {
        let previous = {
            let mut state = self.state.lock();
            if state.disposed {
                drop(state);
                if let Some(next) = next {
                    next.dispose();
                }
                return;
            }
            std::mem::replace(&mut state.current, next)
        };
        if let Some(previous) = previous {
            previous.dispose();
        }
    }

    /// Whether the token itself has been disposed
    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// Whether the token currently holds an occupant
    pub fn is_occupied(&self) -> bool {
        self.state.lock().current.is_some()
    }
}

impl Disposable for MetaDisposable {
    fn dispose(&self) {
        let current = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.current.take()
        };
        if let Some(current) = current {
            current.dispose();
        }
    }
}

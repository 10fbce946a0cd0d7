//! Delivery endpoint of a started signal
//!
//! A subscriber forwards events to the callbacks given to `Signal::start`
//! until it is terminated (by an error, by completion, or by disposal).
//!
//! # Synchronization
//!
//! Producers may call into a subscriber from any thread. Delivery runs
//! under a reentrant lock, and disposal takes the same lock, so:
//! - `dispose()` waits for an in-flight delivery on another thread to
//!   finish, and nothing is delivered after it returns
//! - a callback may dispose its own subscription (same thread, re-entry)

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

use crate::disposable::Disposable;

type NextFn<T> = Arc<dyn Fn(T) + Send + Sync>;
type ErrorFn<E> = Box<dyn FnOnce(E) + Send>;
type CompletedFn = Box<dyn FnOnce() + Send>;

struct Callbacks<T, E> {
    next: Option<NextFn<T>>,
    error: Option<ErrorFn<E>>,
    completed: Option<CompletedFn>,
}

impl<T, E> Callbacks<T, E> {
    fn clear(&mut self) {
        self.next = None;
        self.error = None;
        self.completed = None;
    }
}

/// Synchronized sink for one subscription
pub struct Subscriber<T, E> {
    delivery: ReentrantMutex<RefCell<Callbacks<T, E>>>,
    terminated: AtomicBool,
    disposable: Mutex<Option<Arc<dyn Disposable>>>,
}

impl<T, E> Subscriber<T, E> {
    pub(crate) fn new(
        next: impl Fn(T) + Send + Sync + 'static,
        error: impl FnOnce(E) + Send + 'static,
        completed: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            delivery: ReentrantMutex::new(RefCell::new(Callbacks {
                next: Some(Arc::new(next)),
                error: Some(Box::new(error)),
                completed: Some(Box::new(completed)),
            })),
            terminated: AtomicBool::new(false),
            disposable: Mutex::new(None),
        }
    }

    /// Whether no further events will be delivered
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Deliver a value
    pub fn put_next(&self, value: T) {
        let guard = self.delivery.lock();
        if self.is_terminated() {
            return;
        }
        let next = guard.borrow().next.clone();
        if let Some(next) = next {
            next(value);
        }
    }

    /// Deliver an error and terminate
    pub fn put_error(&self, error: E) {
        {
            let guard = self.delivery.lock();
            if self.terminated.swap(true, Ordering::SeqCst) {
                return;
            }
            let mut callbacks = guard.borrow_mut();
            let callback = callbacks.error.take();
            callbacks.clear();
            drop(callbacks);
            if let Some(callback) = callback {
                callback(error);
            }
        }
        self.release_producer();
    }

    /// Deliver completion and terminate
    pub fn put_completion(&self) {
        {
            let guard = self.delivery.lock();
            if self.terminated.swap(true, Ordering::SeqCst) {
                return;
            }
            let mut callbacks = guard.borrow_mut();
            let callback = callbacks.completed.take();
            callbacks.clear();
            drop(callbacks);
            if let Some(callback) = callback {
                callback();
            }
        }
        self.release_producer();
    }

    /// Attach the producer's disposable. If the subscriber is already
    /// terminated the disposable is disposed right away.
    pub(crate) fn assign_disposable(&self, disposable: Arc<dyn Disposable>) {
        let mut slot = self.disposable.lock();
        if self.is_terminated() {
            drop(slot);
            disposable.dispose();
        } else {
            *slot = Some(disposable);
        }
    }

    /// Terminate without delivering anything and dispose the producer
    pub(crate) fn dispose(&self) {
        {
            let guard = self.delivery.lock();
            self.terminated.store(true, Ordering::SeqCst);
            guard.borrow_mut().clear();
        }
        self.release_producer();
    }

    fn release_producer(&self) {
        let disposable = self.disposable.lock().take();
        if let Some(disposable) = disposable {
            disposable.dispose();
        }
    }
}

/// Handle returned by `Signal::start`
pub(crate) struct SubscriberDisposable<T, E> {
    pub(crate) subscriber: Arc<Subscriber<T, E>>,
}

impl<T: 'static, E: 'static> Disposable for SubscriberDisposable<T, E> {
    fn dispose(&self) {
        self.subscriber.dispose();
    }
}

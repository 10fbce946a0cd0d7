//! Holder of the latest value of a signal

use std::sync::Arc;

use parking_lot::Mutex;

use crate::disposable::{Disposable, MetaDisposable};
use crate::scheduler::Scheduler;
use crate::signal::Signal;

type FirstArrival = Box<dyn FnOnce() + Send>;

/// Keeps the most recent value of one signal at a time.
///
/// Values are applied through the slot's scheduler. Setting a new signal
/// cancels the previous subscription; the current contents stay until the
/// new signal delivers.
pub struct SignalSlot<T> {
    contents: Arc<Mutex<Option<T>>>,
    subscription: MetaDisposable,
    scheduler: Arc<dyn Scheduler>,
}

impl<T: Clone + Send + 'static> SignalSlot<T> {
    /// Create an empty slot applying values through `scheduler`
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            contents: Arc::new(Mutex::new(None)),
            subscription: MetaDisposable::new(),
            scheduler,
        }
    }

    /// Follow `signal`. `on_first` runs once, after the first value lands.
    pub fn set_signal<E: Send + 'static>(
        &self,
        signal: Signal<T, E>,
        on_first: impl FnOnce() + Send + 'static,
    ) {
        let contents = Arc::clone(&self.contents);
        let first: Mutex<Option<FirstArrival>> = Mutex::new(Some(Box::new(on_first)));
        let disposable = signal
            .deliver_on(Arc::clone(&self.scheduler))
            .start_with_next(move |value| {
                *contents.lock() = Some(value);
                let callback = first.lock().take();
                if let Some(callback) = callback {
                    callback();
                }
            });
        self.subscription.set(Some(disposable));
    }

    /// Latest value, if any has arrived
    pub fn contents(&self) -> Option<T> {
        self.contents.lock().clone()
    }

    /// Cancel the subscription and drop the contents
    pub fn clear(&self) {
        self.subscription.set(None);
        *self.contents.lock() = None;
    }
}

impl<T> Drop for SignalSlot<T> {
    fn drop(&mut self) {
        self.subscription.dispose();
    }
}

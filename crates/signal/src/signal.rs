//! Lazy signals
//!
//! A [`Signal`] is a recipe, not a running computation: nothing happens
//! until [`Signal::start`] is called, and every start runs the generator
//! again with a fresh subscriber. The generator returns the disposable that
//! tears its work down.

use std::fmt;
use std::sync::Arc;

use crate::disposable::{Disposable, EmptyDisposable};
use crate::subscriber::{Subscriber, SubscriberDisposable};

/// Error type of signals that cannot fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoError {}

impl fmt::Display for NoError {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl std::error::Error for NoError {}

type Generator<T, E> = dyn Fn(Arc<Subscriber<T, E>>) -> Arc<dyn Disposable> + Send + Sync;

/// Lazy producer of `T` values that may fail with `E`
pub struct Signal<T, E> {
    generator: Arc<Generator<T, E>>,
}

impl<T, E> Clone for Signal<T, E> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
        }
    }
}

impl<T, E> fmt::Debug for Signal<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").finish_non_exhaustive()
    }
}

impl<T: Send + 'static, E: Send + 'static> Signal<T, E> {
    /// Build a signal from a generator.
    ///
    /// The generator runs once per `start`, receives the subscriber to
    /// deliver into, and returns the disposable that cancels its work.
    pub fn new<F>(generator: F) -> Self
    where
        F: Fn(Arc<Subscriber<T, E>>) -> Arc<dyn Disposable> + Send + Sync + 'static,
    {
        Self {
            generator: Arc::new(generator),
        }
    }

    /// Start the signal.
    ///
    /// Returns the subscription handle. Disposing it stops delivery to the
    /// given callbacks and disposes the generator's work.
    pub fn start(
        &self,
        next: impl Fn(T) + Send + Sync + 'static,
        error: impl FnOnce(E) + Send + 'static,
        completed: impl FnOnce() + Send + 'static,
    ) -> Arc<dyn Disposable> {
        let subscriber = Arc::new(Subscriber::new(next, error, completed));
        let disposable = (self.generator)(Arc::clone(&subscriber));
        subscriber.assign_disposable(disposable);
        Arc::new(SubscriberDisposable { subscriber })
    }

    /// Start the signal, observing values only
    pub fn start_with_next(&self, next: impl Fn(T) + Send + Sync + 'static) -> Arc<dyn Disposable> {
        self.start(next, |_| {}, || {})
    }

    /// Start the signal and forward every event into `subscriber`
    pub fn start_into(&self, subscriber: Arc<Subscriber<T, E>>) -> Arc<dyn Disposable> {
        let (on_next, on_error) = (Arc::clone(&subscriber), Arc::clone(&subscriber));
        self.start(
            move |value| on_next.put_next(value),
            move |error| on_error.put_error(error),
            move || subscriber.put_completion(),
        )
    }

    /// Completes without emitting
    pub fn complete() -> Self {
        Self::new(|subscriber| {
            subscriber.put_completion();
            Arc::new(EmptyDisposable)
        })
    }

    /// Never emits and never terminates
    pub fn never() -> Self {
        Self::new(|_| Arc::new(EmptyDisposable))
    }
}

impl<T, E> Signal<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    /// Emits `value` once, then completes
    pub fn single(value: T) -> Self {
        Self::new(move |subscriber| {
            subscriber.put_next(value.clone());
            subscriber.put_completion();
            Arc::new(EmptyDisposable)
        })
    }

    /// Emits each value in order, then completes
    pub fn from_values(values: Vec<T>) -> Self {
        Self::new(move |subscriber| {
            for value in &values {
                subscriber.put_next(value.clone());
            }
            subscriber.put_completion();
            Arc::new(EmptyDisposable)
        })
    }
}

impl<T, E> Signal<T, E>
where
    T: Send + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Fails immediately with `error`
    pub fn fail(error: E) -> Self {
        Self::new(move |subscriber| {
            subscriber.put_error(error.clone());
            Arc::new(EmptyDisposable)
        })
    }
}

//! Signal combinators
//!
//! Every combinator returns a new lazy signal; the source is started once
//! per start of the result, and disposing the result disposes every
//! subscription the combinator opened.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::disposable::{ActionDisposable, Disposable, MetaDisposable};
use crate::scheduler::Scheduler;
use crate::signal::{NoError, Signal};

impl<T: Send + 'static, E: Send + 'static> Signal<T, E> {
    /// Transform each value
    pub fn map<U, F>(&self, f: F) -> Signal<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        Signal::new(move |subscriber| {
            let f = Arc::clone(&f);
            let (on_next, on_error) = (Arc::clone(&subscriber), Arc::clone(&subscriber));
            source.start(
                move |value| on_next.put_next(f(value)),
                move |error| on_error.put_error(error),
                move || subscriber.put_completion(),
            )
        })
    }

    /// Map each value to a signal and follow the latest one
    pub fn map_to_signal<U, F>(&self, f: F) -> Signal<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> Signal<U, E> + Send + Sync + 'static,
    {
        self.map(f).switch_to_latest()
    }

    /// Run `next` after this signal completes.
    ///
    /// Errors from this signal end the result without starting `next`.
    pub fn then(&self, next: Signal<T, E>) -> Signal<T, E> {
        let source = self.clone();
        Signal::new(move |subscriber| {
            let second = Arc::new(MetaDisposable::new());
            let (on_next, on_error) = (Arc::clone(&subscriber), Arc::clone(&subscriber));
            let (slot, next) = (Arc::clone(&second), next.clone());
            let first = source.start(
                move |value| on_next.put_next(value),
                move |error| on_error.put_error(error),
                move || slot.set(Some(next.start_into(subscriber))),
            );
            Arc::new(ActionDisposable::new(move || {
                first.dispose();
                second.dispose();
            }))
        })
    }

    /// Replace a failure with the signal `f` builds from the error
    pub fn catch<E2, F>(&self, f: F) -> Signal<T, E2>
    where
        E2: Send + 'static,
        F: Fn(E) -> Signal<T, E2> + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        Signal::new(move |subscriber| {
            let fallback = Arc::new(MetaDisposable::new());
            let (on_next, on_error) = (Arc::clone(&subscriber), Arc::clone(&subscriber));
            let (slot, f) = (Arc::clone(&fallback), Arc::clone(&f));
            let first = source.start(
                move |value| on_next.put_next(value),
                move |error| slot.set(Some(f(error).start_into(on_error))),
                move || subscriber.put_completion(),
            );
            Arc::new(ActionDisposable::new(move || {
                first.dispose();
                fallback.dispose();
            }))
        })
    }

    /// Deliver every event through `scheduler`.
    ///
    /// Events dispatched before disposal but run after it are dropped.
    pub fn deliver_on(&self, scheduler: Arc<dyn Scheduler>) -> Signal<T, E> {
        let source = self.clone();
        Signal::new(move |subscriber| {
            let (next_scheduler, error_scheduler, completed_scheduler) = (
                Arc::clone(&scheduler),
                Arc::clone(&scheduler),
                Arc::clone(&scheduler),
            );
            let (on_next, on_error) = (Arc::clone(&subscriber), Arc::clone(&subscriber));
            source.start(
                move |value| {
                    let subscriber = Arc::clone(&on_next);
                    next_scheduler.dispatch(Box::new(move || subscriber.put_next(value)));
                },
                move |error| {
                    error_scheduler.dispatch(Box::new(move || on_error.put_error(error)));
                },
                move || {
                    completed_scheduler.dispatch(Box::new(move || subscriber.put_completion()));
                },
            )
        })
    }
}

impl<T: Send + 'static> Signal<T, NoError> {
    /// Same values under a different error type; this signal never fails
    pub fn cast_error<E: Send + 'static>(&self) -> Signal<T, E> {
        self.catch(|never: NoError| match never {})
    }
}

#[derive(Default)]
struct SwitchProgress {
    generation: u64,
    inner_active: bool,
    outer_completed: bool,
}

impl<T: Send + 'static, E: Send + 'static> Signal<Signal<T, E>, E> {
    /// Follow the most recent inner signal.
    ///
    /// The previous inner subscription is disposed before the next inner
    /// signal starts. The result completes once the outer signal and the
    /// current inner signal have both completed.
    pub fn switch_to_latest(&self) -> Signal<T, E> {
        let source = self.clone();
        Signal::new(move |subscriber| {
            let inner = Arc::new(MetaDisposable::new());
            let progress = Arc::new(Mutex::new(SwitchProgress::default()));

            let (next_inner, next_progress) = (Arc::clone(&inner), Arc::clone(&progress));
            let next_subscriber = Arc::clone(&subscriber);
            let on_error = Arc::clone(&subscriber);
            let completed_progress = Arc::clone(&progress);

            let outer = source.start(
                move |signal: Signal<T, E>| {
                    let generation = {
                        let mut progress = next_progress.lock();
                        progress.generation += 1;
                        progress.inner_active = true;
                        progress.generation
                    };
                    next_inner.set(None);

                    let (on_value, on_inner_error) =
                        (Arc::clone(&next_subscriber), Arc::clone(&next_subscriber));
                    let on_inner_completed = Arc::clone(&next_subscriber);
                    let inner_progress = Arc::clone(&next_progress);
                    let disposable = signal.start(
                        move |value| on_value.put_next(value),
                        move |error| on_inner_error.put_error(error),
                        move || {
                            let done = {
                                let mut progress = inner_progress.lock();
                                if progress.generation == generation {
                                    progress.inner_active = false;
                                    progress.outer_completed
                                } else {
                                    false
                                }
                            };
                            if done {
                                on_inner_completed.put_completion();
                            }
                        },
                    );
                    next_inner.set(Some(disposable));
                },
                move |error| on_error.put_error(error),
                move || {
                    let done = {
                        let mut progress = completed_progress.lock();
                        progress.outer_completed = true;
                        !progress.inner_active
                    };
                    if done {
                        subscriber.put_completion();
                    }
                },
            );

            Arc::new(ActionDisposable::new(move || {
                outer.dispose();
                inner.dispose();
            })) as Arc<dyn Disposable>
        })
    }
}

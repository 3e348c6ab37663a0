//! Observer / Observable pattern for cross-thread event delivery.
//!
//! * An **Observable** keeps `Weak` references to registered **Observer**s
//!   and hands each of them every event it emits.
//! * Observers react in [`Observer::update`].
//!
//! Observables here are shared between threads (a managed singleton's
//! registry is reached from every holder), so the observer list sits behind a
//! `Mutex` rather than a `RefCell`. Registration and notification both work
//! through `&self`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// An object that can notify interested parties of events of type `E`.
pub trait Observable<E: 'static> {
    /// Register an observer to receive future events.
    fn register_observer(&self, observer: Weak<dyn Observer<E>>);

    /// Remove a previously registered observer.
    fn unregister_observer(&self, observer: &Weak<dyn Observer<E>>);
}

/// An object that reacts to events emitted by the [`Observable`]s it has
/// subscribed to.
pub trait Observer<E>: Send + Sync {
    /// Called once per emitted event.
    ///
    /// Implementations must not call back into the observable that emitted
    /// the event: the emitter may still hold its own locks.
    fn update(&self, event: &E);
}

/// Observer-list bookkeeping that can be embedded in any observable type.
pub struct ObserverList<E: 'static> {
    observers: Mutex<Vec<Weak<dyn Observer<E>>>>,
}

impl<E: 'static> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> std::fmt::Debug for ObserverList<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("registered", &self.len())
            .finish()
    }
}

impl<E: 'static> ObserverList<E> {
    /// Create a new, empty observer list.
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Weak<dyn Observer<E>>>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an observer.
    pub fn register(&self, observer: Weak<dyn Observer<E>>) {
        self.lock().push(observer);
    }

    /// Remove an observer (by pointer equality of the `Weak`).
    pub fn unregister(&self, observer: &Weak<dyn Observer<E>>) {
        self.lock().retain(|o| !Weak::ptr_eq(o, observer));
    }

    /// Number of registered entries, including ones not yet pruned.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// `true` if no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Deliver `event` to every live observer, pruning dead `Weak`s.
    ///
    /// The list lock is released before any observer runs, so an observer
    /// may register or unregister others from inside `update`.
    pub fn notify(&self, event: &E) {
        let live: Vec<Arc<dyn Observer<E>>> = {
            let mut observers = self.lock();
            observers.retain(|w| w.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        for observer in live {
            observer.update(event);
        }
    }
}

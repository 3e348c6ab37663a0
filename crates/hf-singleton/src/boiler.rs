//! The chocolate boiler, the payload of the managed singleton.
//!
//! A boiler moves through `empty → filled → processed → empty`. Each step
//! only applies from the state before it; any other call is absorbed as a
//! no-op, like a physical device that ignores a button pressed at the wrong
//! time. The two state flags sit behind the boiler's own mutex, which is
//! independent of the registry lock, so business steps on one holder never
//! wait for lifecycle work on another.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::lifecycle::InstanceId;
use crate::registry::Managed;

/// Snapshot of a boiler's content flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoilerState {
    /// `true` when the boiler holds nothing.
    pub empty: bool,
    /// `true` once the current contents were processed (boiled).
    pub processed: bool,
}

impl BoilerState {
    /// A freshly built boiler: empty and unprocessed.
    pub const EMPTY: Self = Self {
        empty: true,
        processed: false,
    };

    /// `processed` never holds without contents.
    pub fn is_consistent(&self) -> bool {
        !(self.empty && self.processed)
    }
}

impl Default for BoilerState {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// A chocolate boiler shared by every holder of a managed registry.
#[derive(Debug)]
pub struct ChocolateBoiler {
    id: InstanceId,
    state: Mutex<BoilerState>,
}

impl ChocolateBoiler {
    /// Build a boiler in the given state.
    pub fn with_state(id: InstanceId, state: BoilerState) -> Self {
        Self {
            id,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoilerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Identity assigned by the registry that built this boiler.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Fill an empty boiler with a milk/chocolate mixture.
    ///
    /// Returns `true` if the boiler changed state.
    pub fn fill(&self) -> bool {
        let mut state = self.lock();
        if !state.empty {
            return false;
        }
        state.empty = false;
        state.processed = false;
        trace!(id = %self.id, "filled the boiler with a milk/chocolate mixture");
        true
    }

    /// Bring filled, unprocessed contents to a boil.
    ///
    /// Returns `true` if the boiler changed state.
    pub fn process(&self) -> bool {
        let mut state = self.lock();
        if state.empty || state.processed {
            return false;
        }
        state.processed = true;
        trace!(id = %self.id, "brought the contents to a boil");
        true
    }

    /// Drain processed contents, leaving the boiler empty.
    ///
    /// Returns `true` if the boiler changed state.
    pub fn drain(&self) -> bool {
        let mut state = self.lock();
        if state.empty || !state.processed {
            return false;
        }
        state.empty = true;
        state.processed = false;
        trace!(id = %self.id, "drained the boiled milk and chocolate");
        true
    }

    /// `true` when the boiler holds nothing.
    pub fn is_empty(&self) -> bool {
        self.lock().empty
    }

    /// `true` once the current contents were processed.
    pub fn is_processed(&self) -> bool {
        self.lock().processed
    }

    /// Both flags, read under a single lock.
    pub fn state(&self) -> BoilerState {
        *self.lock()
    }
}

impl Managed for ChocolateBoiler {
    type Snapshot = BoilerState;

    fn create(id: InstanceId, seed: Option<BoilerState>) -> Self {
        Self::with_state(id, seed.unwrap_or_default())
    }

    fn id(&self) -> InstanceId {
        self.id
    }

    fn snapshot(&self) -> BoilerState {
        self.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boiler() -> ChocolateBoiler {
        ChocolateBoiler::create(InstanceId::new(1), None)
    }

    #[test]
    fn new_boiler_is_empty() {
        let b = boiler();
        assert!(b.is_empty());
        assert!(!b.is_processed());
        assert_eq!(b.state(), BoilerState::EMPTY);
    }

    #[test]
    fn full_cycle() {
        let b = boiler();
        assert!(b.fill());
        assert_eq!(b.state(), BoilerState { empty: false, processed: false });
        assert!(b.process());
        assert_eq!(b.state(), BoilerState { empty: false, processed: true });
        assert!(b.drain());
        assert_eq!(b.state(), BoilerState::EMPTY);
    }

    #[test]
    fn fill_is_idempotent() {
        let b = boiler();
        assert!(b.fill());
        let before = b.state();
        assert!(!b.fill());
        assert_eq!(b.state(), before);

        b.process();
        let boiled = b.state();
        assert!(!b.fill());
        assert_eq!(b.state(), boiled);
    }

    #[test]
    fn process_requires_contents() {
        let b = boiler();
        assert!(!b.process());
        assert!(!b.is_processed());
        assert!(b.is_empty());
    }

    #[test]
    fn drain_requires_processed_contents() {
        let b = boiler();
        assert!(!b.drain());
        assert_eq!(b.state(), BoilerState::EMPTY);

        b.fill();
        assert!(!b.drain());
        assert!(!b.is_empty());
    }

    #[test]
    fn process_twice_is_noop() {
        let b = boiler();
        b.fill();
        assert!(b.process());
        assert!(!b.process());
        assert!(b.is_processed());
    }

    #[test]
    fn seeded_boiler_starts_from_seed() {
        let seed = BoilerState { empty: false, processed: true };
        let b = ChocolateBoiler::create(InstanceId::new(4), Some(seed));
        assert_eq!(b.id(), InstanceId::new(4));
        assert_eq!(b.snapshot(), seed);
        assert!(b.drain());
    }

    #[test]
    fn concurrent_cycles_keep_state_consistent() {
        let b = boiler();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..500 {
                        b.fill();
                        assert!(b.state().is_consistent());
                        b.process();
                        assert!(b.state().is_consistent());
                        b.drain();
                        assert!(b.state().is_consistent());
                    }
                });
            }
        });
    }
}

//! Instance identity and lifecycle notifications.
//!
//! Every construction and retirement performed by a
//! [`SingletonRegistry`](crate::SingletonRegistry) is reported to its
//! registered [`LifecycleObserver`]s as a [`LifecycleEvent`]. Events are
//! emitted while the registry lock is held, so observers see them in the same
//! order the registry applied them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hf_core::Observer;

/// Identity of one managed instance, unique within its registry.
///
/// Ids are handed out in increasing order starting at 1. A recreated
/// instance always gets a fresh id, even when its state was carried over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A construction or retirement of the managed instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A new instance was constructed.
    Created {
        /// Identity of the new instance.
        id: InstanceId,
        /// `true` if the instance started from a carried-over state.
        seeded: bool,
    },
    /// The instance was retired because its usage count reached zero.
    Destroyed {
        /// Identity of the retired instance.
        id: InstanceId,
    },
}

impl LifecycleEvent {
    /// Identity of the instance the event refers to.
    pub fn id(&self) -> InstanceId {
        match *self {
            Self::Created { id, .. } | Self::Destroyed { id } => id,
        }
    }
}

/// Observer of registry lifecycle events.
pub trait LifecycleObserver: Observer<LifecycleEvent> {}

impl<O: Observer<LifecycleEvent> + ?Sized> LifecycleObserver for O {}

/// Observer that counts constructions and retirements.
///
/// ```
/// use std::sync::Arc;
/// use hf_singleton::{ChocolateBoiler, LifecycleCounter, SingletonRegistry};
/// use hf_core::RegistryConfig;
///
/// let counter = Arc::new(LifecycleCounter::default());
/// let registry = SingletonRegistry::<ChocolateBoiler>::new(RegistryConfig::lazy());
/// registry.observe(&counter);
///
/// registry.acquire();
/// registry.release();
/// assert_eq!((counter.created(), counter.destroyed()), (1, 1));
/// ```
#[derive(Debug, Default)]
pub struct LifecycleCounter {
    created: AtomicU64,
    destroyed: AtomicU64,
    last_id: AtomicU64,
}

impl LifecycleCounter {
    /// Create a counter already wrapped for registration.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of `Created` events seen.
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Acquire)
    }

    /// Number of `Destroyed` events seen.
    pub fn destroyed(&self) -> u64 {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Instances currently alive according to the events seen.
    pub fn live(&self) -> u64 {
        self.created().saturating_sub(self.destroyed())
    }

    /// Id carried by the most recent event, if any.
    pub fn last_id(&self) -> Option<InstanceId> {
        match self.last_id.load(Ordering::Acquire) {
            0 => None,
            raw => Some(InstanceId(raw)),
        }
    }
}

impl Observer<LifecycleEvent> for LifecycleCounter {
    fn update(&self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::Created { .. } => self.created.fetch_add(1, Ordering::AcqRel),
            LifecycleEvent::Destroyed { .. } => self.destroyed.fetch_add(1, Ordering::AcqRel),
        };
        self.last_id.store(event.id().get(), Ordering::Release);
    }
}

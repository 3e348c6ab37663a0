//! Reference-counted, thread-safe managed singleton.
//!
//! A [`SingletonRegistry`] owns at most one live instance of a [`Managed`]
//! type and counts the holders using it:
//!
//! * [`acquire`](SingletonRegistry::acquire) creates the instance if it is
//!   absent, bumps the usage count, and hands out a shared reference.
//! * [`release`](SingletonRegistry::release) drops the count and retires the
//!   instance when it reaches zero. The next acquire builds a new one.
//!
//! The check-and-create and decrement-and-retire sequences both run under
//! the registry lock, so two instances are never live at once and the usage
//! count always agrees with the presence of the instance. The payload keeps
//! its own lock for business state.
//!
//! Instead of a hidden global, a registry is an ordinary value that can be
//! shared by reference or `Arc`. [`define_registry!`](crate::define_registry)
//! declares a process-wide one when a static is really wanted.
//!
//! | registry state | event | next state |
//! |----------------|-------|------------|
//! | Absent | acquire | Present (count 1, new instance) |
//! | Present | acquire | Present (count + 1) |
//! | Present | release, count stays > 0 | Present |
//! | Present | release, count hits 0 | Absent (instance retired) |
//! | any, count 0 | release | unchanged (unbalanced, logged) |

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use hf_core::{InitMode, Observable, Observer, ObserverList, RecreatePolicy, RegistryConfig};
use tracing::{debug, trace, warn};

use crate::lifecycle::{InstanceId, LifecycleEvent, LifecycleObserver};

/// A payload type whose single instance is managed by a [`SingletonRegistry`].
pub trait Managed: Send + Sync + 'static {
    /// State carried from a retired instance into its successor under
    /// [`RecreatePolicy::CarryOver`].
    type Snapshot: Clone + Send + fmt::Debug;

    /// Build a new instance. `seed` is `None` unless a previous instance's
    /// state is being carried over.
    fn create(id: InstanceId, seed: Option<Self::Snapshot>) -> Self;

    /// Identity the instance was created with.
    fn id(&self) -> InstanceId;

    /// Capture the current state.
    fn snapshot(&self) -> Self::Snapshot;
}

/// What a call to [`SingletonRegistry::release`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The count dropped but other holders remain.
    Retained {
        /// Holders still using the instance.
        remaining: usize,
    },
    /// The last holder released and the instance was retired.
    Retired {
        /// Identity of the retired instance.
        id: InstanceId,
    },
    /// There was no outstanding acquire. Nothing changed.
    Unbalanced,
}

/// Point-in-time view of a registry, read under its lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Holders that acquired without a matching release.
    pub usage_count: usize,
    /// Identity of the live instance, if any.
    pub current: Option<InstanceId>,
    /// Instances constructed so far.
    pub created: u64,
    /// Instances retired so far.
    pub destroyed: u64,
    /// Releases ignored because nothing was outstanding.
    pub unbalanced_releases: u64,
}

impl RegistryStats {
    /// `true` while an instance is live.
    pub fn is_present(&self) -> bool {
        self.current.is_some()
    }

    /// Instances constructed and not yet retired.
    pub fn live(&self) -> u64 {
        self.created - self.destroyed
    }
}

struct Slot<T: Managed> {
    instance: Option<Arc<T>>,
    usage_count: usize,
    seed: Option<T::Snapshot>,
    next_id: u64,
    created: u64,
    destroyed: u64,
    unbalanced_releases: u64,
}

impl<T: Managed> Slot<T> {
    fn stats(&self) -> RegistryStats {
        RegistryStats {
            usage_count: self.usage_count,
            current: self.instance.as_ref().map(|i| i.id()),
            created: self.created,
            destroyed: self.destroyed,
            unbalanced_releases: self.unbalanced_releases,
        }
    }
}

/// Owner of one reference-counted, lazily or eagerly created instance of `T`.
///
/// ```
/// use hf_core::RegistryConfig;
/// use hf_singleton::{ChocolateBoiler, SingletonRegistry};
///
/// let registry = SingletonRegistry::<ChocolateBoiler>::new(RegistryConfig::lazy());
/// assert!(!registry.is_present());
///
/// let boiler = registry.lease();
/// boiler.fill();
/// boiler.process();
/// boiler.drain();
/// assert_eq!(registry.usage_count(), 1);
///
/// drop(boiler);
/// assert!(!registry.is_present());
/// ```
pub struct SingletonRegistry<T: Managed> {
    config: RegistryConfig,
    slot: Mutex<Slot<T>>,
    observers: ObserverList<LifecycleEvent>,
}

impl<T: Managed> SingletonRegistry<T> {
    /// Create a registry. Under [`InitMode::Eager`] the instance is built
    /// immediately.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_observers(config, std::iter::empty())
    }

    /// Create a registry with observers registered before the eager
    /// construction, if any, takes place.
    pub fn with_observers<I>(config: RegistryConfig, observers: I) -> Self
    where
        I: IntoIterator<Item = Weak<dyn Observer<LifecycleEvent>>>,
    {
        let registry = Self {
            config,
            slot: Mutex::new(Slot {
                instance: None,
                usage_count: 0,
                seed: None,
                next_id: 1,
                created: 0,
                destroyed: 0,
                unbalanced_releases: 0,
            }),
            observers: ObserverList::new(),
        };
        for observer in observers {
            registry.observers.register(observer);
        }
        if config.init == InitMode::Eager {
            let mut slot = registry.lock();
            let (_, event) = registry.construct(&mut slot);
            registry.observers.notify(&event);
        }
        registry
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configuration the registry was built with.
    pub fn config(&self) -> RegistryConfig {
        self.config
    }

    /// Register `observer` for lifecycle events. The registry keeps only a
    /// weak reference.
    pub fn observe<O: LifecycleObserver + 'static>(&self, observer: &Arc<O>) {
        self.observers
            .register(Arc::downgrade(observer) as Weak<dyn Observer<LifecycleEvent>>);
    }

    /// Return the live instance, creating it first if absent, and count the
    /// caller as a holder.
    ///
    /// Each call must be matched by one [`release`](Self::release). The
    /// returned `Arc` must not be used after that release: the registry may
    /// already have retired the instance. [`lease`](Self::lease) ties both
    /// ends to a scope.
    pub fn acquire(&self) -> Arc<T> {
        let mut slot = self.lock();
        let (instance, created) = match slot.instance.clone() {
            Some(instance) => (instance, None),
            None => {
                let (instance, event) = self.construct(&mut slot);
                (instance, Some(event))
            }
        };
        slot.usage_count += 1;

        if let Some(event) = created {
            let rollback = CreationRollback {
                slot: &mut *slot,
                armed: true,
            };
            self.observers.notify(&event);
            rollback.disarm();
        }
        trace!(id = %instance.id(), usage = slot.usage_count, "acquired");
        instance
    }

    /// Stop counting one holder. The instance is retired when the count
    /// reaches zero.
    ///
    /// A release with no outstanding acquire is logged and ignored.
    pub fn release(&self) -> ReleaseOutcome {
        let mut slot = self.lock();
        if slot.usage_count == 0 {
            slot.unbalanced_releases += 1;
            warn!(
                current = ?slot.instance.as_ref().map(|i| i.id()),
                "release without a matching acquire ignored"
            );
            return ReleaseOutcome::Unbalanced;
        }

        slot.usage_count -= 1;
        if slot.usage_count > 0 {
            trace!(usage = slot.usage_count, "released");
            return ReleaseOutcome::Retained {
                remaining: slot.usage_count,
            };
        }

        debug_assert!(
            slot.instance.is_some(),
            "counted holders without a live instance"
        );
        let Some(instance) = slot.instance.take() else {
            warn!("usage count dropped to zero with no live instance");
            return ReleaseOutcome::Retained { remaining: 0 };
        };
        let id = instance.id();
        if self.config.recreate == RecreatePolicy::CarryOver {
            slot.seed = Some(instance.snapshot());
        }
        slot.destroyed += 1;
        debug!(%id, "managed instance destroyed");
        self.observers.notify(&LifecycleEvent::Destroyed { id });
        ReleaseOutcome::Retired { id }
    }

    /// Acquire the instance for the lifetime of the returned guard.
    pub fn lease(&self) -> Lease<'_, T> {
        Lease {
            instance: self.acquire(),
            registry: self,
            armed: true,
        }
    }

    /// Holders currently counted.
    pub fn usage_count(&self) -> usize {
        self.lock().usage_count
    }

    /// `true` while an instance is live.
    pub fn is_present(&self) -> bool {
        self.lock().instance.is_some()
    }

    /// Identity of the live instance, if any.
    pub fn current_id(&self) -> Option<InstanceId> {
        self.lock().instance.as_ref().map(|i| i.id())
    }

    /// Consistent snapshot of the counters and the live instance.
    pub fn stats(&self) -> RegistryStats {
        self.lock().stats()
    }

    /// Build and store a new instance. The caller delivers the returned
    /// event once the slot is consistent.
    fn construct(&self, slot: &mut Slot<T>) -> (Arc<T>, LifecycleEvent) {
        let id = InstanceId::new(slot.next_id);
        slot.next_id += 1;

        let seed = match self.config.recreate {
            RecreatePolicy::Reset => None,
            RecreatePolicy::CarryOver => slot.seed.take(),
        };
        let seeded = seed.is_some();
        if self.config.init == InitMode::Eager && slot.created > 0 {
            debug!(%id, "eager instance was retired earlier, rebuilding on demand");
        }

        let instance = Arc::new(T::create(id, seed));
        debug!(%id, seeded, "managed instance created");
        slot.instance = Some(Arc::clone(&instance));
        slot.created += 1;
        (instance, LifecycleEvent::Created { id, seeded })
    }
}

/// Undoes a fresh acquire if a creation observer panics, so the poisoned
/// slot is recovered with no instance and no holder.
struct CreationRollback<'a, T: Managed> {
    slot: &'a mut Slot<T>,
    armed: bool,
}

impl<T: Managed> CreationRollback<'_, T> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<T: Managed> Drop for CreationRollback<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.slot.usage_count -= 1;
        if self.slot.usage_count == 0 {
            if let Some(instance) = self.slot.instance.take() {
                self.slot.destroyed += 1;
                warn!(id = %instance.id(), "creation observer panicked, instance discarded");
            }
        }
    }
}

impl<T: Managed> Observable<LifecycleEvent> for SingletonRegistry<T> {
    fn register_observer(&self, observer: Weak<dyn Observer<LifecycleEvent>>) {
        self.observers.register(observer);
    }

    fn unregister_observer(&self, observer: &Weak<dyn Observer<LifecycleEvent>>) {
        self.observers.unregister(observer);
    }
}

impl<T: Managed> fmt::Debug for SingletonRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonRegistry")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .field("observers", &self.observers)
            .finish()
    }
}

/// Scope-bound hold on a registry's instance.
///
/// Dereferences to the instance and releases it when dropped.
#[must_use = "dropping a lease releases the instance immediately"]
pub struct Lease<'a, T: Managed> {
    registry: &'a SingletonRegistry<T>,
    instance: Arc<T>,
    armed: bool,
}

impl<T: Managed> Lease<'_, T> {
    /// Release now and report what happened.
    pub fn release(mut self) -> ReleaseOutcome {
        self.armed = false;
        self.registry.release()
    }
}

impl<T: Managed> Deref for Lease<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.instance
    }
}

impl<T: Managed + fmt::Debug> fmt::Debug for Lease<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lease").field(&self.instance).finish()
    }
}

impl<T: Managed> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.registry.release();
        }
    }
}

/// Declare a process-wide managed registry.
///
/// The registry itself is built on first access through `LazyLock`. With an
/// eager configuration the instance comes into existence together with it.
///
/// # Example
/// ```
/// use hf_core::RegistryConfig;
/// use hf_singleton::{define_registry, ChocolateBoiler};
///
/// define_registry!(BOILER, ChocolateBoiler, RegistryConfig::eager());
///
/// let boiler = BOILER.lease();
/// assert!(boiler.fill());
/// ```
#[macro_export]
macro_rules! define_registry {
    ($name:ident, $ty:ty, $config:expr) => {
        /// Process-wide managed singleton registry.
        pub static $name: std::sync::LazyLock<$crate::SingletonRegistry<$ty>> =
            std::sync::LazyLock::new(|| $crate::SingletonRegistry::new($config));
    };
}

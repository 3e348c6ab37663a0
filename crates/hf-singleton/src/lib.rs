//! # hf-singleton
//!
//! Reference-counted, thread-safe managed singletons.
//!
//! A [`SingletonRegistry`] hands out one shared instance to every holder
//! while at least one holder is counted, and retires it when the last one
//! releases. Construction can be lazy (first acquire) or eager (registry
//! construction). The payload shipped here is the [`ChocolateBoiler`], whose
//! `fill`/`process`/`drain` steps run under a lock of their own.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// The chocolate boiler payload.
pub mod boiler;

/// Concurrent holder scenario used by the demo and the tests.
pub mod harness;

/// Instance identity, lifecycle events, and the counting observer.
pub mod lifecycle;

/// The registry, leases, and `define_registry!`.
pub mod registry;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use boiler::{BoilerState, ChocolateBoiler};
pub use harness::{run_holders, HarnessReport, WorkerReport};
pub use lifecycle::{InstanceId, LifecycleCounter, LifecycleEvent, LifecycleObserver};
pub use registry::{Lease, Managed, RegistryStats, ReleaseOutcome, SingletonRegistry};

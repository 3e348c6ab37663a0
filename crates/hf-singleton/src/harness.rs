//! Concurrent holder scenario.
//!
//! Runs the classic boiler demonstration on scoped threads: an optional
//! control holder acquires the boiler before any worker starts and releases
//! it after all of them finished, and each worker leases the boiler, runs
//! `fill → process → drain`, and releases. Workers insert a random number of
//! scheduler yields between steps to shake out different interleavings.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use hf_core::HolderConfig;
use rand::Rng;
use tracing::{debug, debug_span};

use crate::boiler::ChocolateBoiler;
use crate::lifecycle::InstanceId;
use crate::registry::{ReleaseOutcome, SingletonRegistry};

/// What one worker saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    /// Worker index, starting at 0.
    pub worker: usize,
    /// Identity of the boiler the worker leased.
    pub instance: InstanceId,
    /// Business steps that changed the boiler's state (0 to 3).
    pub transitions: usize,
    /// Outcome of the worker's release.
    pub release: ReleaseOutcome,
}

/// Summary of one scenario run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessReport {
    /// Identity held by the control holder, if one ran.
    pub control: Option<InstanceId>,
    /// Outcome of the control holder's release, if one ran.
    pub control_release: Option<ReleaseOutcome>,
    /// One entry per worker, in worker order.
    pub workers: Vec<WorkerReport>,
    /// Highest usage count observed by any worker while holding the boiler.
    pub peak_usage: usize,
}

impl HarnessReport {
    /// Number of different instances the workers observed.
    pub fn distinct_instances(&self) -> usize {
        let mut ids: Vec<InstanceId> = self.workers.iter().map(|w| w.instance).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Total business transitions applied across all workers.
    pub fn transitions(&self) -> usize {
        self.workers.iter().map(|w| w.transitions).sum()
    }
}

fn jitter<R: Rng>(rng: &mut R, bound: u32) {
    if bound == 0 {
        return;
    }
    for _ in 0..rng.gen_range(0..=bound) {
        thread::yield_now();
    }
}

fn run_worker(
    registry: &SingletonRegistry<ChocolateBoiler>,
    worker: usize,
    jitter_bound: u32,
    peak: &AtomicUsize,
) -> WorkerReport {
    let _span = debug_span!("holder", worker).entered();
    let mut rng = rand::thread_rng();

    jitter(&mut rng, jitter_bound);
    let boiler = registry.lease();
    peak.fetch_max(registry.usage_count(), Ordering::AcqRel);

    let mut transitions = usize::from(boiler.fill());
    jitter(&mut rng, jitter_bound);
    transitions += usize::from(boiler.process());
    jitter(&mut rng, jitter_bound);
    transitions += usize::from(boiler.drain());

    let instance = boiler.id();
    let release = boiler.release();
    debug!(%instance, transitions, ?release, "holder finished");
    WorkerReport {
        worker,
        instance,
        transitions,
        release,
    }
}

/// Run the holder scenario against `registry`.
///
/// ```
/// use hf_core::{HolderConfig, RegistryConfig};
/// use hf_singleton::{harness, ChocolateBoiler, SingletonRegistry};
///
/// let registry = SingletonRegistry::<ChocolateBoiler>::new(RegistryConfig::lazy());
/// let report = harness::run_holders(&registry, &HolderConfig::default());
/// assert_eq!(report.distinct_instances(), 1);
/// assert!(!registry.is_present());
/// ```
pub fn run_holders(
    registry: &SingletonRegistry<ChocolateBoiler>,
    config: &HolderConfig,
) -> HarnessReport {
    let peak = AtomicUsize::new(0);
    let control = config.control_holder.then(|| registry.lease());
    let control_id = control.as_ref().map(|lease| lease.id());

    let workers = thread::scope(|s| {
        let handles: Vec<_> = (0..config.workers)
            .map(|worker| {
                let peak = &peak;
                s.spawn(move || run_worker(registry, worker, config.jitter, peak))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join())
            .collect::<Result<Vec<_>, _>>()
    });
    // Release the control holder before surfacing a worker panic so the
    // registry is left balanced either way.
    let control_release = control.map(|lease| lease.release());
    let workers = match workers {
        Ok(workers) => workers,
        Err(panic) => std::panic::resume_unwind(panic),
    };

    HarnessReport {
        control: control_id,
        control_release,
        workers,
        peak_usage: peak.into_inner(),
    }
}

//! Multi-threaded lifecycle tests.
//!
//! These exercise the registry lock (single instance, balanced counts) and
//! the boiler lock (consistent business state) under real contention.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use hf_core::{HolderConfig, Observer, RegistryConfig};
use hf_singleton::{
    run_holders, ChocolateBoiler, LifecycleCounter, LifecycleEvent, ReleaseOutcome,
    SingletonRegistry,
};

type Registry = SingletonRegistry<ChocolateBoiler>;

const THREADS: usize = 8;
const ROUNDS: usize = 200;

/// Fails the test if two instances are ever live at once.
#[derive(Default)]
struct SingleLiveCheck {
    live: Mutex<Option<u64>>,
    violated: AtomicBool,
}

impl Observer<LifecycleEvent> for SingleLiveCheck {
    fn update(&self, event: &LifecycleEvent) {
        let mut live = self.live.lock().unwrap();
        match *event {
            LifecycleEvent::Created { id, .. } => {
                if live.is_some() {
                    self.violated.store(true, Ordering::SeqCst);
                }
                *live = Some(id.get());
            }
            LifecycleEvent::Destroyed { id } => {
                if *live != Some(id.get()) {
                    self.violated.store(true, Ordering::SeqCst);
                }
                *live = None;
            }
        }
    }
}

// ─── Registry lock ────────────────────────────────────────────────────────────

#[test]
fn simultaneous_first_acquire_constructs_once() {
    let registry = Registry::new(RegistryConfig::lazy());
    let counter = LifecycleCounter::shared();
    registry.observe(&counter);
    let barrier = Barrier::new(THREADS);

    let ids: HashSet<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    registry.acquire().id()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(ids.len(), 1, "all holders must observe the same instance");
    assert_eq!(counter.created(), 1);
    assert_eq!(registry.usage_count(), THREADS);

    for _ in 0..THREADS - 1 {
        assert!(matches!(registry.release(), ReleaseOutcome::Retained { .. }));
    }
    assert!(matches!(registry.release(), ReleaseOutcome::Retired { .. }));
    assert_eq!((counter.created(), counter.destroyed()), (1, 1));
}

#[test]
fn churn_never_has_two_live_instances() {
    let registry = Registry::new(RegistryConfig::lazy());
    let check = Arc::new(SingleLiveCheck::default());
    registry.observe(&check);

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..ROUNDS {
                    let boiler = registry.lease();
                    boiler.fill();
                    let stats = registry.stats();
                    assert!(stats.usage_count > 0);
                    assert_eq!(stats.live(), 1);
                    assert_eq!(stats.current, Some(boiler.id()));
                    drop(boiler);
                }
            });
        }
    });

    assert!(!check.violated.load(Ordering::SeqCst));
    let stats = registry.stats();
    assert_eq!(stats.usage_count, 0);
    assert_eq!(stats.created, stats.destroyed);
    assert!(stats.created >= 1);
    assert_eq!(stats.unbalanced_releases, 0);
}

#[test]
fn stats_invariant_holds_at_every_observation() {
    let registry = Registry::new(RegistryConfig::lazy());
    let done = AtomicBool::new(false);

    let samples = thread::scope(|s| {
        let observer = s.spawn(|| {
            let mut samples = 0_usize;
            loop {
                let finished = done.load(Ordering::Acquire);
                let stats = registry.stats();
                let expected = u64::from(stats.usage_count > 0);
                assert_eq!(stats.live(), expected, "{stats:?}");
                samples += 1;
                if finished {
                    break samples;
                }
                thread::yield_now();
            }
        });
        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    for _ in 0..ROUNDS {
                        registry.acquire();
                        thread::yield_now();
                        registry.release();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        done.store(true, Ordering::Release);
        observer.join().unwrap()
    });

    assert!(samples > 0);
    let stats = registry.stats();
    assert_eq!(stats.live(), 0);
    assert_eq!(stats.created, stats.destroyed);
}

#[test]
fn extra_releases_under_contention_stay_clamped() {
    let registry = Registry::new(RegistryConfig::lazy());
    let counter = LifecycleCounter::shared();
    registry.observe(&counter);

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..ROUNDS {
                    registry.release();
                }
            });
        }
    });

    let stats = registry.stats();
    assert_eq!(stats.usage_count, 0);
    assert_eq!(stats.unbalanced_releases, (THREADS * ROUNDS) as u64);
    assert_eq!(counter.destroyed(), 0);
}

#[test]
fn retire_then_acquire_sees_fresh_instance() {
    let registry = Registry::new(RegistryConfig::lazy());
    let first = registry.acquire();
    first.fill();
    let first_id = first.id();

    let retired = thread::scope(|s| s.spawn(|| registry.release()).join().unwrap());
    assert_eq!(retired, ReleaseOutcome::Retired { id: first_id });

    let second = thread::scope(|s| s.spawn(|| registry.acquire()).join().unwrap());
    assert_ne!(second.id(), first_id);
    assert!(second.is_empty());
    registry.release();
}

// ─── Business lock ────────────────────────────────────────────────────────────

#[test]
fn shared_boiler_state_stays_consistent() {
    let registry = Registry::new(RegistryConfig::eager());
    let control = registry.lease();

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..ROUNDS {
                    let boiler = registry.lease();
                    boiler.fill();
                    assert!(boiler.state().is_consistent());
                    boiler.process();
                    assert!(boiler.state().is_consistent());
                    boiler.drain();
                    assert!(boiler.state().is_consistent());
                }
            });
        }
    });

    assert_eq!(registry.usage_count(), 1);
    assert!(control.state().is_consistent());
    assert!(matches!(control.release(), ReleaseOutcome::Retired { .. }));
}

#[test]
fn business_steps_do_not_block_lifecycle() {
    let registry = Registry::new(RegistryConfig::lazy());
    let boiler = registry.lease();

    // Hold the boiler busy on another thread while this one acquires and
    // releases; the registry lock must stay available throughout.
    let stop = AtomicBool::new(false);
    thread::scope(|s| {
        s.spawn(|| {
            while !stop.load(Ordering::Acquire) {
                boiler.fill();
                boiler.process();
                boiler.drain();
            }
        });
        for _ in 0..ROUNDS {
            let extra = registry.lease();
            assert_eq!(extra.id(), boiler.id());
        }
        stop.store(true, Ordering::Release);
    });
    assert_eq!(registry.usage_count(), 1);
}

// ─── Holder scenario ──────────────────────────────────────────────────────────

#[test]
fn demo_scenario_with_control_holder() {
    let registry = Registry::new(RegistryConfig::lazy());
    let counter = LifecycleCounter::shared();
    registry.observe(&counter);

    let report = run_holders(
        &registry,
        &HolderConfig {
            workers: 6,
            control_holder: true,
            jitter: 32,
        },
    );

    assert_eq!(report.distinct_instances(), 1);
    assert_eq!(report.workers.len(), 6);
    assert!(report
        .workers
        .iter()
        .all(|w| matches!(w.release, ReleaseOutcome::Retained { .. })));
    assert_eq!((counter.created(), counter.destroyed()), (1, 1));
    assert!(!registry.is_present());
}

#[test]
fn demo_scenario_eager_without_control() {
    let registry = Registry::new(RegistryConfig::eager());
    let report = run_holders(
        &registry,
        &HolderConfig {
            workers: 6,
            control_holder: false,
            jitter: 32,
        },
    );
    let stats = registry.stats();
    assert_eq!(stats.usage_count, 0);
    assert_eq!(stats.live(), u64::from(stats.is_present()));
    assert!(report.distinct_instances() >= 1);
}

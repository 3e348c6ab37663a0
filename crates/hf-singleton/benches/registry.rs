use std::hint::black_box;
use std::thread;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hf_core::RegistryConfig;
use hf_singleton::{ChocolateBoiler, SingletonRegistry};

type Registry = SingletonRegistry<ChocolateBoiler>;

fn bench_acquire_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("acquire_release");

    // A control holder keeps the instance alive: no construction per cycle.
    let pinned = Registry::new(RegistryConfig::lazy());
    let _control = pinned.lease();
    group.bench_function("pinned", |b| {
        b.iter(|| {
            black_box(pinned.acquire());
            pinned.release()
        })
    });

    // Every cycle builds and retires an instance.
    let churn = Registry::new(RegistryConfig::lazy());
    group.bench_function("churn", |b| {
        b.iter(|| {
            black_box(churn.acquire());
            churn.release()
        })
    });

    group.bench_function("lease_cycle", |b| {
        b.iter(|| {
            let boiler = pinned.lease();
            boiler.fill();
            boiler.process();
            black_box(boiler.drain())
        })
    });
    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_leases");
    for threads in [2_usize, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &n| {
            let registry = Registry::new(RegistryConfig::eager());
            let _control = registry.lease();
            b.iter(|| {
                thread::scope(|s| {
                    for _ in 0..n {
                        s.spawn(|| {
                            for _ in 0..100 {
                                let boiler = registry.lease();
                                black_box(boiler.fill());
                            }
                        });
                    }
                })
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_acquire_release, bench_contended);
criterion_main!(benches);

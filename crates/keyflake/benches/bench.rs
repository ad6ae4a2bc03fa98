use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use keyflake::{EPOCH, IdAllocator, Identity, MonotonicClock, SystemClock, TimeSource};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded). One full millisecond of sequence space.
const TOTAL_IDS: usize = 4096;

fn identity() -> Identity {
    Identity::new(1, 1).expect("valid identity")
}

/// Hot path: a frozen clock, so every call takes the same-millisecond branch.
fn bench_fixed_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocator/fixed");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                let allocator = IdAllocator::new(
                    identity(),
                    FixedMockTime {
                        millis: EPOCH + 1,
                    },
                );
                for _ in 0..TOTAL_IDS {
                    black_box(allocator.next_id().expect("id"));
                }
            }
            start.elapsed()
        });
    });

    group.finish();
}

/// Real clocks, including the sequence-exhaustion spin.
fn bench_clocks(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocator/clock");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    let system = IdAllocator::new(identity(), SystemClock);
    group.bench_function("system", |b| {
        b.iter(|| {
            for _ in 0..TOTAL_IDS {
                black_box(system.next_id().expect("id"));
            }
        });
    });

    let monotonic = IdAllocator::new(identity(), MonotonicClock::new());
    group.bench_function("monotonic", |b| {
        b.iter(|| {
            for _ in 0..TOTAL_IDS {
                black_box(monotonic.next_id().expect("id"));
            }
        });
    });

    group.finish();
}

/// Contention: several threads sharing one allocator handle.
fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocator/contended");

    for threads in [2usize, 4, 8, 16] {
        group.throughput(Throughput::Elements((threads * TOTAL_IDS) as u64));
        group.bench_function(format!("threads/{threads}"), |b| {
            b.iter_custom(|iters| {
                let allocator = IdAllocator::new(identity(), SystemClock);
                let barrier = Arc::new(Barrier::new(threads + 1));
                let start = scope(|s| {
                    for _ in 0..threads {
                        let allocator = allocator.clone();
                        let barrier = Arc::clone(&barrier);
                        s.spawn(move || {
                            barrier.wait();
                            for _ in 0..iters {
                                for _ in 0..TOTAL_IDS {
                                    black_box(allocator.next_id().expect("id"));
                                }
                            }
                        });
                    }
                    barrier.wait();
                    Instant::now()
                });
                start.elapsed()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fixed_clock, bench_clocks, bench_contended);
criterion_main!(benches);

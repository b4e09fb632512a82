/*!
 * Synchronization Backend Benchmarks
 *
 * Compare lock round-trips across backend tiers, table entry
 * acquisition, and the thread-creation handshake
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use platform_sync::sync::{create_condvar, create_lock, mode, SyncApiMode};
use platform_sync::table::{ScopedLock, TableInit, KIND_LOCALE};
use platform_sync::thread;
use std::sync::Arc;

fn backend_modes() -> Vec<(SyncApiMode, &'static str)> {
    let mut modes = vec![(SyncApiMode::Slim, "slim")];
    #[cfg(unix)]
    modes.push((SyncApiMode::Native, "native"));
    modes
}

fn bench_uncontended_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncontended_round_trip");

    for (api_mode, name) in backend_modes() {
        mode::set_sync_api_mode(api_mode);
        let lock = create_lock();

        group.bench_with_input(BenchmarkId::from_parameter(name), &lock, |b, lock| {
            b.iter(|| {
                lock.lock();
                unsafe { lock.unlock() };
            });
        });
    }

    mode::set_sync_api_mode(SyncApiMode::Normal);
    group.finish();
}

fn bench_contended_increments(c: &mut Criterion) {
    use std::cell::UnsafeCell;

    struct Counter {
        lock: platform_sync::sync::SyncLock,
        value: UnsafeCell<u64>,
    }
    unsafe impl Sync for Counter {}

    let mut group = c.benchmark_group("contended_increments");
    group.sample_size(20);

    for (api_mode, name) in backend_modes() {
        mode::set_sync_api_mode(api_mode);

        group.bench_with_input(BenchmarkId::from_parameter(name), &(), |b, _| {
            b.iter(|| {
                let counter = Arc::new(Counter {
                    lock: create_lock(),
                    value: UnsafeCell::new(0),
                });

                let workers: Vec<_> = (0..4)
                    .map(|_| {
                        let counter = Arc::clone(&counter);
                        std::thread::spawn(move || {
                            for _ in 0..1_000 {
                                counter.lock.lock();
                                unsafe { *counter.value.get() += 1 };
                                unsafe { counter.lock.unlock() };
                            }
                        })
                    })
                    .collect();
                for worker in workers {
                    worker.join().unwrap();
                }

                black_box(unsafe { *counter.value.get() })
            });
        });
    }

    mode::set_sync_api_mode(SyncApiMode::Normal);
    group.finish();
}

fn bench_notify_no_waiters(c: &mut Criterion) {
    c.bench_function("notify_no_waiters", |b| {
        let cond = create_condvar();

        b.iter(|| {
            // Wake with no waiters (should be fast)
            black_box(cond.notify_one());
        });
    });
}

fn bench_table_entry(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_entry");
    let _guard = TableInit::new();

    for depth in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| {
                let mut held = Vec::with_capacity(depth);
                for _ in 0..depth {
                    held.push(ScopedLock::new(KIND_LOCALE));
                }
                black_box(&held);
            });
        });
    }

    group.finish();
}

fn nothing(_data: *mut ()) -> u32 {
    0
}

fn bench_create_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("thread_create_join");
    group.sample_size(20);

    group.bench_function("handshake", |b| {
        b.iter(|| {
            let handle = unsafe { thread::create(nothing, std::ptr::null_mut()) }.unwrap();
            thread::join(handle).unwrap()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_uncontended_round_trip,
    bench_contended_increments,
    bench_notify_no_waiters,
    bench_table_entry,
    bench_create_join
);

criterion_main!(benches);

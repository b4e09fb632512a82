/*!
 * Backend Selection Integration Tests
 *
 * Ladder behavior across modes and probe faults, per-backend mutual
 * exclusion, and the bounded try_lock_for degradation
 */

use platform_sync::sync::{
    create_condvar, create_condvar_in, create_lock, create_lock_in, mode, probe, select_backend,
    Availability, BackendKind, SyncApiMode, SyncCondvar, SyncLock, CONDVAR_MAX_ALIGN,
    CONDVAR_MAX_SIZE, LOCK_MAX_ALIGN, LOCK_MAX_SIZE,
};
use serial_test::serial;
use std::cell::UnsafeCell;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn reset_globals() {
    mode::set_sync_api_mode(SyncApiMode::Normal);
    probe::override_slim(None);
    probe::override_native(None);
    probe::override_pool(None);
}

#[test]
fn test_ladder_full_grid() {
    let everything = Availability {
        slim: true,
        native: true,
    };
    let nothing = Availability {
        slim: false,
        native: false,
    };
    let native_only = Availability {
        slim: false,
        native: true,
    };

    assert_eq!(
        select_backend(SyncApiMode::Normal, everything),
        Some(BackendKind::Slim)
    );
    assert_eq!(
        select_backend(SyncApiMode::Slim, everything),
        Some(BackendKind::Slim)
    );
    assert_eq!(
        select_backend(SyncApiMode::Normal, native_only),
        Some(BackendKind::Native)
    );
    assert_eq!(
        select_backend(SyncApiMode::Native, everything),
        Some(BackendKind::Native)
    );

    // The ladder only ever falls downward.
    let bottom = select_backend(SyncApiMode::Cooperative, everything);
    let exhausted = select_backend(SyncApiMode::Normal, nothing);
    if cfg!(feature = "cooperative") {
        assert_eq!(bottom, Some(BackendKind::Cooperative));
        assert_eq!(exhausted, Some(BackendKind::Cooperative));
    } else {
        assert_eq!(bottom, None);
        assert_eq!(exhausted, None);
    }
}

#[test]
#[serial]
#[cfg(not(feature = "slim_only"))]
fn test_mode_steers_the_factory() {
    reset_globals();

    mode::set_sync_api_mode(SyncApiMode::Normal);
    assert_eq!(create_lock().backend_kind(), BackendKind::Slim);

    #[cfg(unix)]
    {
        mode::set_sync_api_mode(SyncApiMode::Native);
        assert_eq!(create_lock().backend_kind(), BackendKind::Native);
        assert_eq!(create_condvar().backend_kind(), BackendKind::Native);
    }

    reset_globals();
}

#[test]
#[serial]
#[cfg(all(unix, not(feature = "slim_only")))]
fn test_probe_fault_falls_through_to_native() {
    reset_globals();

    probe::override_slim(Some(false));
    assert_eq!(create_lock().backend_kind(), BackendKind::Native);

    reset_globals();
}

#[test]
#[serial]
#[cfg(not(feature = "slim_only"))]
fn test_existing_primitives_keep_their_backend() {
    reset_globals();

    let lock = create_lock();
    assert_eq!(lock.backend_kind(), BackendKind::Slim);

    #[cfg(unix)]
    {
        mode::set_sync_api_mode(SyncApiMode::Native);
        // Constructed before the mode change, still slim.
        assert_eq!(lock.backend_kind(), BackendKind::Slim);
        assert_eq!(create_lock().backend_kind(), BackendKind::Native);
    }

    reset_globals();
}

// The constrained build pins the factory to the slim tier; modes and
// probe faults only matter to the full ladder.
#[test]
#[serial]
#[cfg(feature = "slim_only")]
fn test_slim_only_ignores_steering() {
    reset_globals();

    mode::set_sync_api_mode(SyncApiMode::Native);
    probe::override_slim(Some(false));
    assert_eq!(create_lock().backend_kind(), BackendKind::Slim);
    assert_eq!(create_condvar().backend_kind(), BackendKind::Slim);

    reset_globals();
}

struct Counter {
    lock: SyncLock,
    value: UnsafeCell<u64>,
}

unsafe impl Sync for Counter {}

fn hammer_counter(counter: Arc<Counter>) {
    const ROUNDS: u64 = 10_000;

    let workers: Vec<_> = (0..2)
        .map(|_| {
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for _ in 0..ROUNDS {
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

    assert_eq!(unsafe { *counter.value.get() }, 2 * ROUNDS);
}

#[test]
#[serial]
fn test_slim_mutual_exclusion() {
    reset_globals();
    mode::set_sync_api_mode(SyncApiMode::Slim);
    hammer_counter(Arc::new(Counter {
        lock: create_lock(),
        value: UnsafeCell::new(0),
    }));
    reset_globals();
}

#[test]
#[serial]
#[cfg(unix)]
fn test_native_mutual_exclusion() {
    reset_globals();
    mode::set_sync_api_mode(SyncApiMode::Native);
    hammer_counter(Arc::new(Counter {
        lock: create_lock(),
        value: UnsafeCell::new(0),
    }));
    reset_globals();
}

fn assert_bounded_probe(lock: Arc<SyncLock>) {
    lock.lock();

    let contender = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || {
            let start = Instant::now();
            let acquired = lock.try_lock_for(Duration::from_secs(10));
            (acquired, start.elapsed())
        })
    };

    let (acquired, elapsed) = contender.join().unwrap();
    assert!(!acquired, "degraded probe must not acquire a held lock");
    assert!(
        elapsed < Duration::from_millis(50),
        "degraded probe took {elapsed:?}"
    );
    unsafe { lock.unlock() };
}

#[test]
#[serial]
fn test_slim_try_lock_for_degrades_to_a_probe() {
    reset_globals();
    mode::set_sync_api_mode(SyncApiMode::Slim);
    assert_bounded_probe(Arc::new(create_lock()));
    reset_globals();
}

#[test]
#[serial]
#[cfg(unix)]
fn test_native_try_lock_for_degrades_to_a_probe() {
    reset_globals();
    mode::set_sync_api_mode(SyncApiMode::Native);
    assert_bounded_probe(Arc::new(create_lock()));
    reset_globals();
}

#[test]
#[serial]
#[cfg(all(unix, not(feature = "slim_only")))]
#[should_panic(expected = "different backend")]
fn test_cross_backend_pairing_panics() {
    reset_globals();

    mode::set_sync_api_mode(SyncApiMode::Native);
    let cond = create_condvar();
    mode::set_sync_api_mode(SyncApiMode::Slim);
    let lock = create_lock();
    mode::set_sync_api_mode(SyncApiMode::Normal);

    lock.lock();
    unsafe { cond.wait(&lock) };
}

#[test]
#[serial]
fn test_condvar_signals_across_threads() {
    reset_globals();

    struct Shared {
        lock: SyncLock,
        cond: SyncCondvar,
        flag: UnsafeCell<bool>,
    }
    unsafe impl Sync for Shared {}

    let shared = Arc::new(Shared {
        lock: create_lock(),
        cond: create_condvar(),
        flag: UnsafeCell::new(false),
    });

    let waiter = {
        let shared = Arc::clone(&shared);
        thread::spawn(move || {
            shared.lock.lock();
            unsafe {
                while !*shared.flag.get() {
                    shared.cond.wait(&shared.lock);
                }
                shared.lock.unlock();
            }
        })
    };

    thread::sleep(Duration::from_millis(20));
    shared.lock.lock();
    unsafe { *shared.flag.get() = true };
    shared.cond.notify_one();
    unsafe { shared.lock.unlock() };
    waiter.join().unwrap();
}

#[test]
#[serial]
fn test_placement_constructor_round_trip() {
    reset_globals();

    let mut slot = std::mem::MaybeUninit::<SyncLock>::uninit();
    unsafe {
        create_lock_in(slot.as_mut_ptr());
        let lock = slot.assume_init_mut();
        lock.lock();
        lock.unlock();
        lock.destroy();
        // Destroy is idempotent; dropping in place after it is fine.
        std::ptr::drop_in_place(slot.as_mut_ptr());
    }

    assert!(LOCK_MAX_SIZE >= std::mem::size_of::<usize>());
    assert!(LOCK_MAX_ALIGN.is_power_of_two());
}

#[test]
#[serial]
fn test_placed_condvar_waits_against_a_placed_lock() {
    reset_globals();

    let mut lock_slot = std::mem::MaybeUninit::<SyncLock>::uninit();
    let mut cond_slot = std::mem::MaybeUninit::<SyncCondvar>::uninit();
    unsafe {
        create_lock_in(lock_slot.as_mut_ptr());
        create_condvar_in(cond_slot.as_mut_ptr());
        let lock = lock_slot.assume_init_mut();
        let cond = cond_slot.assume_init_mut();

        // Placed back to back, both land on the same selection.
        lock.lock();
        let woken = cond.wait_for(lock, Duration::from_millis(20));
        assert!(!woken);
        lock.unlock();

        cond.destroy();
        lock.destroy();
        std::ptr::drop_in_place(cond_slot.as_mut_ptr());
        std::ptr::drop_in_place(lock_slot.as_mut_ptr());
    }

    assert!(CONDVAR_MAX_SIZE >= std::mem::size_of::<usize>());
    assert!(CONDVAR_MAX_ALIGN.is_power_of_two());
}

#[test]
#[serial]
fn test_timed_wait_expires_against_the_clock() {
    reset_globals();

    let lock = create_lock();
    let cond = create_condvar();
    lock.lock();
    let start = Instant::now();
    let woken = unsafe { cond.wait_for(&lock, Duration::from_millis(60)) };
    let elapsed = start.elapsed();
    unsafe { lock.unlock() };

    assert!(!woken);
    assert!(elapsed >= Duration::from_millis(55));
    assert!(elapsed < Duration::from_millis(500)); // Should not overshoot
}

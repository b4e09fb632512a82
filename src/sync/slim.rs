/*!
 * Slim Tier
 * Word-sized lock over the process parking lot, plus the keyed-parking
 * condition variable shared with the cooperative tier
 */

use super::backend::{CondvarBackend, LockBackend};
use parking_lot::lock_api::RawMutex as _;
use parking_lot_core::{self, ParkResult, DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};
use std::time::{Duration, Instant};

/// One-word exclusive lock. Never recursive, no owner bookkeeping.
pub struct SlimLock {
    raw: parking_lot::RawMutex,
}

impl SlimLock {
    pub fn new() -> Self {
        Self {
            raw: parking_lot::RawMutex::INIT,
        }
    }
}

impl Default for SlimLock {
    fn default() -> Self {
        Self::new()
    }
}

impl LockBackend for SlimLock {
    #[inline]
    fn lock(&self) {
        self.raw.lock();
    }

    #[inline]
    fn try_lock(&self) -> bool {
        self.raw.try_lock()
    }

    #[inline]
    fn try_lock_for(&self, _timeout: Duration) -> bool {
        self.raw.try_lock()
    }

    #[inline]
    unsafe fn unlock(&self) {
        unsafe { self.raw.unlock() };
    }

    fn destroy(&mut self) {}
}

/// Condition variable parked on its own address.
///
/// Waiters enqueue under the parking-lot bucket lock before the paired
/// mutex is released, so a notify that follows a state change made under
/// that mutex cannot be lost.
pub struct ParkCondvar {
    // Park queues are keyed by address; the field keeps every instance at
    // a distinct one.
    _key: u8,
}

impl ParkCondvar {
    pub fn new() -> Self {
        Self { _key: 0 }
    }

    #[inline]
    fn key(&self) -> usize {
        self as *const ParkCondvar as usize
    }

    /// Parks the calling thread on this condvar's queue. `unlock` runs
    /// once the waiter is enqueued; `relock` runs before returning.
    /// Returns `false` when the park timed out.
    pub fn park_with(
        &self,
        unlock: impl FnOnce(),
        relock: impl FnOnce(),
        timeout: Option<Duration>,
    ) -> bool {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let result = unsafe {
            parking_lot_core::park(
                self.key(),
                || true,
                unlock,
                |_, _| {},
                DEFAULT_PARK_TOKEN,
                deadline,
            )
        };
        relock();
        !matches!(result, ParkResult::TimedOut)
    }

    pub fn notify_one(&self) {
        unsafe {
            parking_lot_core::unpark_one(self.key(), |_| DEFAULT_UNPARK_TOKEN);
        }
    }

    pub fn notify_all(&self) {
        unsafe {
            parking_lot_core::unpark_all(self.key(), DEFAULT_UNPARK_TOKEN);
        }
    }
}

impl Default for ParkCondvar {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait/notify half of the slim tier.
pub struct SlimCondvar {
    park: ParkCondvar,
}

impl SlimCondvar {
    pub fn new() -> Self {
        Self {
            park: ParkCondvar::new(),
        }
    }
}

impl Default for SlimCondvar {
    fn default() -> Self {
        Self::new()
    }
}

impl CondvarBackend for SlimCondvar {
    type Lock = SlimLock;

    unsafe fn wait(&self, lock: &SlimLock) {
        self.park
            .park_with(|| unsafe { lock.unlock() }, || lock.lock(), None);
    }

    unsafe fn wait_for(&self, lock: &SlimLock, timeout: Duration) -> bool {
        self.park
            .park_with(|| unsafe { lock.unlock() }, || lock.lock(), Some(timeout))
    }

    fn notify_one(&self) {
        self.park.notify_one();
    }

    fn notify_all(&self) {
        self.park.notify_all();
    }

    fn destroy(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn lock_excludes_second_acquirer() {
        let lock = SlimLock::new();
        lock.lock();
        assert!(!lock.try_lock());
        unsafe { lock.unlock() };
        assert!(lock.try_lock());
        unsafe { lock.unlock() };
    }

    #[test]
    fn timed_wait_reports_timeout() {
        let lock = SlimLock::new();
        let cond = SlimCondvar::new();
        lock.lock();
        let woken = unsafe { cond.wait_for(&lock, Duration::from_millis(20)) };
        assert!(!woken);
        unsafe { lock.unlock() };
    }

    #[test]
    fn notify_wakes_parked_waiter() {
        struct Shared {
            lock: SlimLock,
            cond: SlimCondvar,
            ready: AtomicUsize,
        }
        let shared = Arc::new(Shared {
            lock: SlimLock::new(),
            cond: SlimCondvar::new(),
            ready: AtomicUsize::new(0),
        });

        let waiter = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                shared.lock.lock();
                while shared.ready.load(Ordering::Relaxed) == 0 {
                    unsafe { shared.cond.wait(&shared.lock) };
                }
                unsafe { shared.lock.unlock() };
            })
        };

        std::thread::sleep(Duration::from_millis(10));
        shared.lock.lock();
        shared.ready.store(1, Ordering::Relaxed);
        shared.cond.notify_one();
        unsafe { shared.lock.unlock() };
        waiter.join().unwrap();
    }
}

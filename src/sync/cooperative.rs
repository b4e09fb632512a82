/*!
 * Cooperative Tier
 * Userspace queued lock standing in for a cooperative concurrency
 * runtime. Final rung of the selection ladder, and the only tier whose
 * timed acquisition honors the requested timeout
 */

use super::backend::{CondvarBackend, LockBackend};
use super::slim::ParkCondvar;
use parking_lot_core::{self, ParkResult, SpinWait, DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

const LOCKED_BIT: u8 = 0b01;
const PARKED_BIT: u8 = 0b10;

/// Byte-state lock parked on the state word's address.
pub struct CoopLock {
    state: AtomicU8,
}

impl CoopLock {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(0),
        }
    }

    #[inline]
    fn key(&self) -> usize {
        &self.state as *const AtomicU8 as usize
    }

    fn acquire(&self, deadline: Option<Instant>) -> bool {
        let mut spin = SpinWait::new();
        let mut state = self.state.load(Ordering::Relaxed);
        loop {
            if state & LOCKED_BIT == 0 {
                match self.state.compare_exchange_weak(
                    state,
                    state | LOCKED_BIT,
                    Ordering::Acquire,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => return true,
                    Err(observed) => {
                        state = observed;
                        continue;
                    }
                }
            }

            if state & PARKED_BIT == 0 {
                if spin.spin() {
                    state = self.state.load(Ordering::Relaxed);
                    continue;
                }
                if let Err(observed) = self.state.compare_exchange_weak(
                    state,
                    state | PARKED_BIT,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    state = observed;
                    continue;
                }
            }

            let result = unsafe {
                parking_lot_core::park(
                    self.key(),
                    || self.state.load(Ordering::Relaxed) == LOCKED_BIT | PARKED_BIT,
                    || {},
                    |_, was_last| {
                        if was_last {
                            self.state.fetch_and(!PARKED_BIT, Ordering::Relaxed);
                        }
                    },
                    DEFAULT_PARK_TOKEN,
                    deadline,
                )
            };
            if let ParkResult::TimedOut = result {
                return false;
            }

            spin.reset();
            state = self.state.load(Ordering::Relaxed);
        }
    }

    unsafe fn release(&self) {
        if self
            .state
            .compare_exchange(LOCKED_BIT, 0, Ordering::Release, Ordering::Relaxed)
            .is_ok()
        {
            return;
        }
        // A waiter is (or was) parked; hand the state transition to the
        // queue so the PARKED bit stays accurate.
        unsafe {
            parking_lot_core::unpark_one(self.key(), |result| {
                let remainder = if result.have_more_threads {
                    PARKED_BIT
                } else {
                    0
                };
                self.state.store(remainder, Ordering::Release);
                DEFAULT_UNPARK_TOKEN
            });
        }
    }
}

impl Default for CoopLock {
    fn default() -> Self {
        Self::new()
    }
}

impl LockBackend for CoopLock {
    #[inline]
    fn lock(&self) {
        if self
            .state
            .compare_exchange_weak(0, LOCKED_BIT, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            self.acquire(None);
        }
    }

    #[inline]
    fn try_lock(&self) -> bool {
        let mut state = self.state.load(Ordering::Relaxed);
        loop {
            if state & LOCKED_BIT != 0 {
                return false;
            }
            match self.state.compare_exchange_weak(
                state,
                state | LOCKED_BIT,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(observed) => state = observed,
            }
        }
    }

    fn try_lock_for(&self, timeout: Duration) -> bool {
        if self.try_lock() {
            return true;
        }
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.acquire(Some(deadline)),
            None => self.acquire(None),
        }
    }

    #[inline]
    unsafe fn unlock(&self) {
        unsafe { self.release() };
    }

    fn destroy(&mut self) {}
}

/// Wait/notify half of the cooperative tier.
pub struct CoopCondvar {
    park: ParkCondvar,
}

impl CoopCondvar {
    pub fn new() -> Self {
        Self {
            park: ParkCondvar::new(),
        }
    }
}

impl Default for CoopCondvar {
    fn default() -> Self {
        Self::new()
    }
}

impl CondvarBackend for CoopCondvar {
    type Lock = CoopLock;

    unsafe fn wait(&self, lock: &CoopLock) {
        self.park
            .park_with(|| unsafe { lock.unlock() }, || lock.lock(), None);
    }

    unsafe fn wait_for(&self, lock: &CoopLock, timeout: Duration) -> bool {
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

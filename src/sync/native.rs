/*!
 * Native Tier
 * OS mutex/condvar objects over pthread. Boxed so the OS object never
 * moves once initialized
 */

use super::backend::{CondvarBackend, LockBackend};
use std::cell::UnsafeCell;
use std::time::Duration;

/// Exclusive pthread mutex.
pub struct NativeLock {
    inner: Box<UnsafeCell<libc::pthread_mutex_t>>,
}

unsafe impl Send for NativeLock {}
unsafe impl Sync for NativeLock {}

impl NativeLock {
    pub fn new() -> Self {
        let inner = Box::new(UnsafeCell::new(libc::PTHREAD_MUTEX_INITIALIZER));
        let rc = unsafe { libc::pthread_mutex_init(inner.get(), std::ptr::null()) };
        debug_assert_eq!(rc, 0);
        Self { inner }
    }

    #[inline]
    fn raw(&self) -> *mut libc::pthread_mutex_t {
        self.inner.get()
    }
}

impl Default for NativeLock {
    fn default() -> Self {
        Self::new()
    }
}

impl LockBackend for NativeLock {
    fn lock(&self) {
        let rc = unsafe { libc::pthread_mutex_lock(self.raw()) };
        debug_assert_eq!(rc, 0);
    }

    fn try_lock(&self) -> bool {
        unsafe { libc::pthread_mutex_trylock(self.raw()) == 0 }
    }

    fn try_lock_for(&self, _timeout: Duration) -> bool {
        self.try_lock()
    }

    unsafe fn unlock(&self) {
        let rc = unsafe { libc::pthread_mutex_unlock(self.raw()) };
        debug_assert_eq!(rc, 0);
    }

    fn destroy(&mut self) {
        let rc = unsafe { libc::pthread_mutex_destroy(self.raw()) };
        debug_assert_eq!(rc, 0);
    }
}

/// Pthread condition variable. Timed waits measure against the monotonic
/// clock so wall-clock adjustments cannot stretch them.
pub struct NativeCondvar {
    inner: Box<UnsafeCell<libc::pthread_cond_t>>,
}

unsafe impl Send for NativeCondvar {}
unsafe impl Sync for NativeCondvar {}

impl NativeCondvar {
    #[cfg(not(target_vendor = "apple"))]
    pub fn new() -> Self {
        use std::mem::MaybeUninit;

        let inner = Box::new(UnsafeCell::new(libc::PTHREAD_COND_INITIALIZER));
        unsafe {
            let mut attr = MaybeUninit::<libc::pthread_condattr_t>::uninit();
            let rc = libc::pthread_condattr_init(attr.as_mut_ptr());
            debug_assert_eq!(rc, 0);
            let rc = libc::pthread_condattr_setclock(attr.as_mut_ptr(), libc::CLOCK_MONOTONIC);
            debug_assert_eq!(rc, 0);
            let rc = libc::pthread_cond_init(inner.get(), attr.as_ptr());
            debug_assert_eq!(rc, 0);
            let rc = libc::pthread_condattr_destroy(attr.as_mut_ptr());
            debug_assert_eq!(rc, 0);
        }
        Self { inner }
    }

    // Apple has no pthread_condattr_setclock; relative timed waits are
    // made through the _np interface instead.
    #[cfg(target_vendor = "apple")]
    pub fn new() -> Self {
        Self {
            inner: Box::new(UnsafeCell::new(libc::PTHREAD_COND_INITIALIZER)),
        }
    }

    #[inline]
    fn raw(&self) -> *mut libc::pthread_cond_t {
        self.inner.get()
    }
}

impl Default for NativeCondvar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_vendor = "apple"))]
fn deadline_after(now: libc::timespec, timeout: Duration) -> libc::timespec {
    const NANOS_PER_SEC: libc::c_long = 1_000_000_000;
    let add_secs = timeout.as_secs().min(libc::time_t::MAX as u64 / 2) as libc::time_t;
    let mut tv_sec = now.tv_sec.saturating_add(add_secs);
    let mut tv_nsec = now.tv_nsec + timeout.subsec_nanos() as libc::c_long;
    if tv_nsec >= NANOS_PER_SEC {
        tv_nsec -= NANOS_PER_SEC;
        tv_sec = tv_sec.saturating_add(1);
    }
    libc::timespec { tv_sec, tv_nsec }
}

impl CondvarBackend for NativeCondvar {
    type Lock = NativeLock;

    unsafe fn wait(&self, lock: &NativeLock) {
        let rc = unsafe { libc::pthread_cond_wait(self.raw(), lock.raw()) };
        debug_assert_eq!(rc, 0);
    }

    #[cfg(not(target_vendor = "apple"))]
    unsafe fn wait_for(&self, lock: &NativeLock, timeout: Duration) -> bool {
        let mut now = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        let rc = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut now) };
        debug_assert_eq!(rc, 0);
        let deadline = deadline_after(now, timeout);
        let rc = unsafe { libc::pthread_cond_timedwait(self.raw(), lock.raw(), &deadline) };
        debug_assert!(rc == 0 || rc == libc::ETIMEDOUT);
        rc == 0
    }

    #[cfg(target_vendor = "apple")]
    unsafe fn wait_for(&self, lock: &NativeLock, timeout: Duration) -> bool {
        let ts = libc::timespec {
            tv_sec: timeout.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
            tv_nsec: timeout.subsec_nanos() as libc::c_long,
        };
        let rc =
            unsafe { libc::pthread_cond_timedwait_relative_np(self.raw(), lock.raw(), &ts) };
        debug_assert!(rc == 0 || rc == libc::ETIMEDOUT);
        rc == 0
    }

    fn notify_one(&self) {
        let rc = unsafe { libc::pthread_cond_signal(self.raw()) };
        debug_assert_eq!(rc, 0);
    }

    fn notify_all(&self) {
        let rc = unsafe { libc::pthread_cond_broadcast(self.raw()) };
        debug_assert_eq!(rc, 0);
    }

    fn destroy(&mut self) {
        let rc = unsafe { libc::pthread_cond_destroy(self.raw()) };
        debug_assert_eq!(rc, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_excludes_second_acquirer() {
        let mut lock = NativeLock::new();
        lock.lock();
        assert!(!lock.try_lock());
        unsafe { lock.unlock() };
        assert!(lock.try_lock());
        unsafe { lock.unlock() };
        lock.destroy();
    }

    #[test]
    fn timed_wait_reports_timeout() {
        let mut lock = NativeLock::new();
        let mut cond = NativeCondvar::new();
        lock.lock();
        let woken = unsafe { cond.wait_for(&lock, Duration::from_millis(20)) };
        assert!(!woken);
        unsafe { lock.unlock() };
        cond.destroy();
        lock.destroy();
    }
}

/*!
 * Recursive Lock
 * Owner-tracked reentrant mutex for the named-lock table and the legacy
 * compat surface, where callers re-enter while already holding the lock
 */

use parking_lot::lock_api::RawReentrantMutex;
use parking_lot::{RawMutex, RawThreadId};

/// Reentrant lock: the owning thread may lock again, and must unlock as
/// many times as it locked.
pub struct RecursiveLock {
    raw: RawReentrantMutex<RawMutex, RawThreadId>,
}

impl RecursiveLock {
    pub fn new() -> Self {
        Self {
            raw: RawReentrantMutex::INIT,
        }
    }

    #[inline]
    pub fn lock(&self) {
        self.raw.lock();
    }

    /// Releases one level of ownership.
    ///
    /// # Safety
    /// The calling thread must hold the lock.
    #[inline]
    pub unsafe fn unlock(&self) {
        unsafe { self.raw.unlock() };
    }

    /// Whether any thread currently holds the lock.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }
}

impl Default for RecursiveLock {
    fn default() -> Self {
        Self::new()
    }
}

/*!
 * Legacy Mutex Surface
 * Four free functions over an opaque recursive mutex pointer, kept so
 * binaries built against the old surface keep working. New code uses the
 * lock/condvar abstraction instead
 */

use crate::sync::RecursiveLock;

/// Opaque recursive mutex; callers only ever hold the pointer.
pub struct CompatMutex {
    inner: RecursiveLock,
}

/// Allocates a mutex and returns the owning pointer.
pub fn mutex_new() -> *mut CompatMutex {
    Box::into_raw(Box::new(CompatMutex {
        inner: RecursiveLock::new(),
    }))
}

/// Frees a mutex created by [`mutex_new`].
///
/// # Safety
/// `mutex` must come from [`mutex_new`], be unlocked, and never be used
/// again.
pub unsafe fn mutex_delete(mutex: *mut CompatMutex) {
    drop(unsafe { Box::from_raw(mutex) });
}

/// Acquires the mutex; the owning thread may re-enter.
///
/// # Safety
/// `mutex` must be a live pointer from [`mutex_new`].
pub unsafe fn mutex_lock(mutex: *mut CompatMutex) {
    unsafe { (*mutex).inner.lock() };
}

/// Releases one level of ownership.
///
/// # Safety
/// `mutex` must be a live pointer from [`mutex_new`], locked by the
/// calling thread.
pub unsafe fn mutex_unlock(mutex: *mut CompatMutex) {
    unsafe { (*mutex).inner.unlock() };
}

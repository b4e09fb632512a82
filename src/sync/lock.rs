/*!
 * Opaque Lock Storage
 * Exactly one backend variant lives in a SyncLock from construction to
 * teardown. Owners that manage storage explicitly call destroy(); Drop
 * covers the rest
 */

use super::backend::{BackendKind, LockBackend};
use super::slim::SlimLock;
use std::time::Duration;

#[cfg(feature = "cooperative")]
use super::cooperative::CoopLock;
#[cfg(unix)]
use super::native::NativeLock;

pub(crate) enum LockImpl {
    Slim(SlimLock),
    #[cfg(unix)]
    Native(NativeLock),
    #[cfg(feature = "cooperative")]
    Cooperative(CoopLock),
    Destroyed,
}

/// Lock primitive over the backend the factory selected at construction.
///
/// Must not be moved while held or while a condition variable waits
/// against it.
pub struct SyncLock {
    pub(crate) imp: LockImpl,
}

impl SyncLock {
    pub(crate) fn from_impl(imp: LockImpl) -> Self {
        Self { imp }
    }

    #[inline]
    fn backend(&self) -> &dyn LockBackend {
        match &self.imp {
            LockImpl::Slim(lock) => lock,
            #[cfg(unix)]
            LockImpl::Native(lock) => lock,
            #[cfg(feature = "cooperative")]
            LockImpl::Cooperative(lock) => lock,
            LockImpl::Destroyed => panic!("lock used after destroy"),
        }
    }

    /// Which tier is live in this storage.
    pub fn backend_kind(&self) -> BackendKind {
        match &self.imp {
            LockImpl::Slim(_) => BackendKind::Slim,
            #[cfg(unix)]
            LockImpl::Native(_) => BackendKind::Native,
            #[cfg(feature = "cooperative")]
            LockImpl::Cooperative(_) => BackendKind::Cooperative,
            LockImpl::Destroyed => panic!("lock used after destroy"),
        }
    }

    /// Blocks until the lock is acquired.
    #[inline]
    pub fn lock(&self) {
        self.backend().lock();
    }

    /// Single non-blocking acquisition probe.
    #[inline]
    pub fn try_lock(&self) -> bool {
        self.backend().try_lock()
    }

    /// Timed acquisition. The slim and native tiers degrade this to one
    /// probe; the cooperative tier honors the timeout.
    #[inline]
    pub fn try_lock_for(&self, timeout: Duration) -> bool {
        self.backend().try_lock_for(timeout)
    }

    /// Releases the lock.
    ///
    /// # Safety
    /// The calling thread must currently hold the lock.
    #[inline]
    pub unsafe fn unlock(&self) {
        unsafe { self.backend().unlock() };
    }

    /// Tears down the backend object. Idempotent; the storage must not
    /// be locked when called and must not be used afterwards.
    pub fn destroy(&mut self) {
        let mut imp = std::mem::replace(&mut self.imp, LockImpl::Destroyed);
        match &mut imp {
            LockImpl::Slim(lock) => lock.destroy(),
            #[cfg(unix)]
            LockImpl::Native(lock) => lock.destroy(),
            #[cfg(feature = "cooperative")]
            LockImpl::Cooperative(lock) => lock.destroy(),
            LockImpl::Destroyed => {}
        }
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        if !matches!(self.imp, LockImpl::Destroyed) {
            self.destroy();
        }
    }
}

/*!
 * Opaque Condvar Storage
 * Backend-tagged condition variable. Waits dispatch on the (condvar,
 * lock) pair and reject cross-backend pairings
 */

use super::backend::{BackendKind, CondvarBackend};
use super::lock::{LockImpl, SyncLock};
use super::slim::SlimCondvar;
use std::time::Duration;

#[cfg(feature = "cooperative")]
use super::cooperative::CoopCondvar;
#[cfg(unix)]
use super::native::NativeCondvar;

pub(crate) enum CondvarImpl {
    Slim(SlimCondvar),
    #[cfg(unix)]
    Native(NativeCondvar),
    #[cfg(feature = "cooperative")]
    Cooperative(CoopCondvar),
    Destroyed,
}

/// Condition variable over the backend the factory selected at
/// construction. Only pairs with locks of the same backend.
pub struct SyncCondvar {
    pub(crate) imp: CondvarImpl,
}

impl SyncCondvar {
    pub(crate) fn from_impl(imp: CondvarImpl) -> Self {
        Self { imp }
    }

    /// Which tier is live in this storage.
    pub fn backend_kind(&self) -> BackendKind {
        match &self.imp {
            CondvarImpl::Slim(_) => BackendKind::Slim,
            #[cfg(unix)]
            CondvarImpl::Native(_) => BackendKind::Native,
            #[cfg(feature = "cooperative")]
            CondvarImpl::Cooperative(_) => BackendKind::Cooperative,
            CondvarImpl::Destroyed => panic!("condition variable used after destroy"),
        }
    }

    /// Atomically releases `lock`, blocks until notified, reacquires.
    /// Wakeups may be spurious; callers loop on their predicate.
    ///
    /// # Safety
    /// The calling thread must hold `lock`.
    ///
    /// # Panics
    /// If `lock` comes from a different backend than this condvar.
    pub unsafe fn wait(&self, lock: &SyncLock) {
        match (&self.imp, &lock.imp) {
            (CondvarImpl::Slim(cond), LockImpl::Slim(lock)) => unsafe { cond.wait(lock) },
            #[cfg(unix)]
            (CondvarImpl::Native(cond), LockImpl::Native(lock)) => unsafe { cond.wait(lock) },
            #[cfg(feature = "cooperative")]
            (CondvarImpl::Cooperative(cond), LockImpl::Cooperative(lock)) => unsafe {
                cond.wait(lock)
            },
            _ => panic!("condition variable paired with a lock from a different backend"),
        }
    }

    /// Timed form of [`wait`](Self::wait); returns `false` on timeout.
    ///
    /// # Safety
    /// The calling thread must hold `lock`.
    ///
    /// # Panics
    /// If `lock` comes from a different backend than this condvar.
    pub unsafe fn wait_for(&self, lock: &SyncLock, timeout: Duration) -> bool {
        match (&self.imp, &lock.imp) {
            (CondvarImpl::Slim(cond), LockImpl::Slim(lock)) => unsafe {
                cond.wait_for(lock, timeout)
            },
            #[cfg(unix)]
            (CondvarImpl::Native(cond), LockImpl::Native(lock)) => unsafe {
                cond.wait_for(lock, timeout)
            },
            #[cfg(feature = "cooperative")]
            (CondvarImpl::Cooperative(cond), LockImpl::Cooperative(lock)) => unsafe {
                cond.wait_for(lock, timeout)
            },
            _ => panic!("condition variable paired with a lock from a different backend"),
        }
    }

    /// Wakes one waiter.
    pub fn notify_one(&self) {
        match &self.imp {
            CondvarImpl::Slim(cond) => cond.notify_one(),
            #[cfg(unix)]
            CondvarImpl::Native(cond) => cond.notify_one(),
            #[cfg(feature = "cooperative")]
            CondvarImpl::Cooperative(cond) => cond.notify_one(),
            CondvarImpl::Destroyed => panic!("condition variable used after destroy"),
        }
    }

    /// Wakes every waiter.
    pub fn notify_all(&self) {
        match &self.imp {
            CondvarImpl::Slim(cond) => cond.notify_all(),
            #[cfg(unix)]
            CondvarImpl::Native(cond) => cond.notify_all(),
            #[cfg(feature = "cooperative")]
            CondvarImpl::Cooperative(cond) => cond.notify_all(),
            CondvarImpl::Destroyed => panic!("condition variable used after destroy"),
        }
    }

    /// Tears down the backend object. Idempotent; no thread may be
    /// waiting when called, and the storage must not be used afterwards.
    pub fn destroy(&mut self) {
        let mut imp = std::mem::replace(&mut self.imp, CondvarImpl::Destroyed);
        match &mut imp {
            CondvarImpl::Slim(cond) => cond.destroy(),
            #[cfg(unix)]
            CondvarImpl::Native(cond) => cond.destroy(),
            #[cfg(feature = "cooperative")]
            CondvarImpl::Cooperative(cond) => cond.destroy(),
            CondvarImpl::Destroyed => {}
        }
    }
}

impl Drop for SyncCondvar {
    fn drop(&mut self) {
        if !matches!(self.imp, CondvarImpl::Destroyed) {
            self.destroy();
        }
    }
}

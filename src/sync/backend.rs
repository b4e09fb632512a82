/*!
 * Backend Contract
 * Capability traits every lock/condvar tier implements, and the tier tag
 */

use std::time::Duration;

/// Identifies which tier is live inside a primitive's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Word-sized parking-lot lock, the default tier.
    Slim,
    /// OS pthread objects, the legacy tier (unix targets).
    Native,
    /// Userspace queued lock honoring timed acquisition.
    Cooperative,
}

impl BackendKind {
    /// Short name for logs and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Slim => "slim",
            BackendKind::Native => "native",
            BackendKind::Cooperative => "cooperative",
        }
    }
}

/// Exclusive lock capability.
///
/// Implementations are address-stable: a lock must not be moved while it
/// is held or while a condition variable is waiting against it.
pub trait LockBackend {
    /// Blocks until the lock is acquired.
    fn lock(&self);

    /// Single non-blocking acquisition probe.
    fn try_lock(&self) -> bool;

    /// Timed acquisition. OS-backed tiers degrade this to a single probe;
    /// only the cooperative tier honors the timeout.
    fn try_lock_for(&self, timeout: Duration) -> bool;

    /// Releases the lock.
    ///
    /// # Safety
    /// The calling thread must currently hold the lock.
    unsafe fn unlock(&self);

    /// Tears down the OS object, if any. Called at most once.
    fn destroy(&mut self);
}

/// Wait/notify capability paired with a lock of the same tier.
///
/// Waits may wake spuriously; callers loop on their predicate.
pub trait CondvarBackend {
    type Lock: LockBackend;

    /// Atomically releases `lock`, blocks until notified, and reacquires.
    ///
    /// # Safety
    /// The calling thread must hold `lock`.
    unsafe fn wait(&self, lock: &Self::Lock);

    /// Timed form of [`wait`](Self::wait); returns `false` on timeout.
    ///
    /// # Safety
    /// The calling thread must hold `lock`.
    unsafe fn wait_for(&self, lock: &Self::Lock, timeout: Duration) -> bool;

    /// Wakes one waiter.
    fn notify_one(&self);

    /// Wakes every waiter.
    fn notify_all(&self);

    /// Tears down the OS object, if any. Called at most once.
    fn destroy(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(BackendKind::Slim.name(), "slim");
        assert_eq!(BackendKind::Native.name(), "native");
        assert_eq!(BackendKind::Cooperative.name(), "cooperative");
    }
}

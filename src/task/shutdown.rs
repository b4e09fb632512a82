/*!
 * Outstanding Work Accounting
 * Counter guarded by a factory-built lock/condvar pair, and the blocker
 * that drains it before teardown. Counting is skipped entirely when the
 * host is a shared library: loader teardown sequencing already
 * guarantees no other threads are running by then
 */

use super::host::{host, HostStatus};
use crate::sync::{create_condvar, create_lock, SyncCondvar, SyncLock};
use crate::table::TableInit;
use log::debug;
use std::cell::UnsafeCell;
use std::sync::OnceLock;

struct Monitor {
    lock: SyncLock,
    drained: SyncCondvar,
    // Only touched under `lock`.
    outstanding: UnsafeCell<usize>,
    // The task runtime keeps the named-lock table alive once used, so
    // late callbacks can still reach the at-thread-exit entry.
    _table: TableInit,
}

unsafe impl Send for Monitor {}
unsafe impl Sync for Monitor {}

fn monitor() -> &'static Monitor {
    static MONITOR: OnceLock<Monitor> = OnceLock::new();
    MONITOR.get_or_init(|| Monitor {
        lock: create_lock(),
        drained: create_condvar(),
        outstanding: UnsafeCell::new(0),
        _table: TableInit::new(),
    })
}

pub(crate) fn increment_outstanding() {
    if host().status() == HostStatus::SharedLibrary {
        return;
    }
    let monitor = monitor();
    monitor.lock.lock();
    unsafe {
        *monitor.outstanding.get() += 1;
        monitor.lock.unlock();
    }
}

pub(crate) fn decrement_outstanding() {
    if host().status() == HostStatus::SharedLibrary {
        return;
    }
    let monitor = monitor();
    monitor.lock.lock();
    let drained = unsafe {
        let count = &mut *monitor.outstanding.get();
        debug_assert!(*count > 0, "outstanding-task counter underflow");
        *count = count.saturating_sub(1);
        *count == 0
    };
    unsafe { monitor.lock.unlock() };
    if drained {
        monitor.drained.notify_all();
    }
}

/// Count of scheduled-but-not-completed chores. Always 0 when the host
/// is a shared library, where counting is disabled.
pub fn outstanding_tasks() -> usize {
    if host().status() == HostStatus::SharedLibrary {
        return 0;
    }
    let monitor = monitor();
    monitor.lock.lock();
    let count = unsafe { *monitor.outstanding.get() };
    unsafe { monitor.lock.unlock() };
    count
}

/// Guard whose `Drop` blocks until every outstanding chore has finished.
///
/// The embedding executable holds one across its lifetime so teardown
/// cannot outrun scheduled work; shared-library hosts skip the wait.
pub struct ShutdownBlocker(());

impl ShutdownBlocker {
    pub fn new() -> Self {
        ShutdownBlocker(())
    }
}

impl Default for ShutdownBlocker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ShutdownBlocker {
    fn drop(&mut self) {
        if host().status() == HostStatus::SharedLibrary {
            return;
        }
        let monitor = monitor();
        monitor.lock.lock();
        unsafe {
            while *monitor.outstanding.get() != 0 {
                monitor.drained.wait(&monitor.lock);
            }
            monitor.lock.unlock();
        }
        debug!("shutdown blocker drained");
    }
}

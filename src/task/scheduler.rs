/*!
 * Chore Scheduling
 * schedule binds a work object and submits it, reschedule resubmits the
 * same object, release closes it. The dispatch trampolines do the
 * outstanding accounting and hand back the per-dispatch host pin
 */

use super::chore::{Chore, WorkHandle, WorkObject};
use super::host::{host, HostStatus};
use super::pool;
use super::shutdown::{decrement_outstanding, increment_outstanding};
use crate::core::errors::{TaskError, TaskResult};
use crate::sync::probe;
use log::{error, trace};
use std::sync::Arc;

/// Submits the chore for one execution, binding a pool work object on
/// the modern path or queueing directly on the legacy runner.
///
/// # Safety
/// `chore` must stay alive and in place until every submitted execution
/// has completed, and its data pointer must satisfy the callback from
/// any thread.
pub unsafe fn schedule_chore(chore: &mut Chore) -> TaskResult<()> {
    if chore.work.is_some() {
        return Err(TaskError::AlreadyScheduled);
    }

    if probe::pool_available() {
        let work = Arc::new(WorkObject {
            chore: chore as *mut Chore as usize,
        });
        chore.work = Some(WorkHandle::Pool(work));
        let submitted = unsafe { reschedule_chore(chore) };
        if submitted.is_err() {
            // A failed schedule leaves the chore unscheduled.
            chore.work = None;
        }
        return submitted;
    }

    // Legacy queue: no per-dispatch release signal exists, so a loadable
    // host stays pinned for the remaining process lifetime.
    let host = host();
    if host.status() != HostStatus::Executable {
        host.pin_permanent(chore.callback as usize);
    }
    chore.work = Some(WorkHandle::Legacy);
    match pool::submit_legacy(chore as *mut Chore as usize) {
        Ok(()) => {
            trace!("chore queued on the legacy runner");
            Ok(())
        }
        Err(err) => {
            chore.work = None;
            error!("legacy work submission failed: {err}");
            Err(TaskError::Submit(err))
        }
    }
}

/// Resubmits an already-bound work object for another execution.
///
/// # Safety
/// Same contract as [`schedule_chore`].
pub unsafe fn reschedule_chore(chore: &mut Chore) -> TaskResult<()> {
    let work = match &chore.work {
        Some(WorkHandle::Pool(work)) => Arc::clone(work),
        Some(WorkHandle::Legacy) => return Err(TaskError::LegacyHandle),
        None => return Err(TaskError::NotScheduled),
    };

    // Reference taken per dispatch; the trampoline hands it back when
    // the callback returns.
    let host = host();
    let pinned = host.status() != HostStatus::Executable;
    if pinned {
        host.pin(chore.callback as usize);
    }

    match pool::submit(work) {
        Ok(()) => {
            trace!("chore submitted to the pool");
            Ok(())
        }
        Err(err) => {
            if pinned {
                host.unpin(chore.callback as usize);
            }
            error!("pool submission failed: {err}");
            Err(TaskError::Submit(err))
        }
    }
}

/// Closes the native work object, if any, and resets the handle. Safe on
/// an unscheduled chore; the legacy marker has nothing to close.
pub fn release_chore(chore: &mut Chore) {
    match chore.work.take() {
        Some(WorkHandle::Pool(work)) => {
            // Queued clones keep the object alive until those executions
            // have dispatched.
            drop(work);
            trace!("work object closed");
        }
        Some(WorkHandle::Legacy) | None => {}
    }
}

struct DispatchGuard {
    callback: usize,
    pinned: bool,
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        decrement_outstanding();
        if self.pinned {
            host().unpin(self.callback);
        }
    }
}

/// Runs one pool dispatch. The callback and data are copied out before
/// invocation so the callback may release or reschedule its own chore.
pub(crate) fn run_pool_work(work: Arc<WorkObject>) {
    increment_outstanding();
    let (callback, data) = {
        let chore = work.chore as *const Chore;
        unsafe { ((*chore).callback, (*chore).data) }
    };
    let pinned = host().status() != HostStatus::Executable;
    let _guard = DispatchGuard {
        callback: callback as usize,
        pinned,
    };
    callback(data as *mut ());
}

/// Runs one legacy dispatch. The permanent pin taken at schedule time is
/// never handed back.
pub(crate) fn run_legacy_work(chore: usize) {
    increment_outstanding();
    let (callback, data) = {
        let chore = chore as *const Chore;
        unsafe { ((*chore).callback, (*chore).data) }
    };
    let _guard = DispatchGuard {
        callback: callback as usize,
        pinned: false,
    };
    callback(data as *mut ());
}

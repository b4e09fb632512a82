/*!
 * Thread Primitives
 * Create/join/detach and friends over native threads. Creation hands the
 * start arguments across with a lock/condvar handshake, so the argument
 * block on the creator's stack may be reused as soon as create() returns
 */

use crate::core::errors::{ThreadError, ThreadResult};
use crate::core::types::{ExitCode, ThreadId, ThreadProc};
use crate::sync::{create_condvar, create_lock, SyncCondvar, SyncLock};
use log::trace;
use std::cell::UnsafeCell;
use std::time::Duration;

pub mod exit;

pub use exit::register_exit_hook;

/// Handle to a native thread. Equality is identifier equality; the join
/// handle inside is consumed by [`join`] or [`detach`].
#[derive(Debug)]
pub struct ThreadHandle {
    id: ThreadId,
    native: Option<std::thread::JoinHandle<ExitCode>>,
}

impl ThreadHandle {
    /// Identifier of the underlying thread.
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Whether [`join`] or [`detach`] can still consume this handle.
    pub fn joinable(&self) -> bool {
        self.native.is_some()
    }
}

impl PartialEq for ThreadHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ThreadHandle {}

struct Handshake {
    lock: SyncLock,
    cond: SyncCondvar,
    // Only touched under `lock`.
    started: UnsafeCell<bool>,
}

unsafe impl Sync for Handshake {}

struct StartBinder {
    callback: ThreadProc,
    data: *mut (),
    handshake: *const Handshake,
}

/// Starts a native thread running `callback(data)`.
///
/// The new thread copies the start arguments out of this call's stack
/// frame and only then lets `create` return, so the frame (and any
/// argument block the caller reuses per call) is safe to tear down
/// immediately afterwards. The pointee of `data` is a contract between
/// caller and callback.
///
/// # Safety
/// `data` must be valid for whatever access `callback` performs, from
/// any thread, until the callback has finished using it.
pub unsafe fn create(callback: ThreadProc, data: *mut ()) -> ThreadResult<ThreadHandle> {
    let handshake = Handshake {
        lock: create_lock(),
        cond: create_condvar(),
        started: UnsafeCell::new(false),
    };
    let binder = StartBinder {
        callback,
        data,
        handshake: &handshake,
    };
    let binder_addr = &binder as *const StartBinder as usize;

    handshake.lock.lock();
    let spawned = std::thread::Builder::new().spawn(move || trampoline(binder_addr));
    let native = match spawned {
        Ok(native) => native,
        Err(err) => {
            // No thread, no handshake.
            unsafe { handshake.lock.unlock() };
            return Err(ThreadError::Spawn(err));
        }
    };

    unsafe {
        while !*handshake.started.get() {
            handshake.cond.wait(&handshake.lock);
        }
        handshake.lock.unlock();
    }

    let id = native.thread().id();
    trace!("native thread started: {:?}", id);
    Ok(ThreadHandle {
        id,
        native: Some(native),
    })
}

fn trampoline(binder_addr: usize) -> ExitCode {
    // Copy the start arguments out of the creator's stack, then let the
    // creator proceed; the binder and handshake are dead after this block.
    let StartBinder {
        callback,
        data,
        handshake,
    } = unsafe { (binder_addr as *const StartBinder).read() };
    {
        let handshake = unsafe { &*handshake };
        handshake.lock.lock();
        unsafe { *handshake.started.get() = true };
        handshake.cond.notify_one();
        unsafe { handshake.lock.unlock() };
    }

    let code = callback(data);
    exit::run_exit_hooks();
    code
}

/// Waits for the thread to finish and returns its exit code, consuming
/// the handle's native half.
pub fn join(mut handle: ThreadHandle) -> ThreadResult<ExitCode> {
    let native = handle.native.take().ok_or(ThreadError::NotJoinable)?;
    native.join().map_err(|_| ThreadError::Terminated)
}

/// Releases the handle without waiting; the thread keeps running.
pub fn detach(mut handle: ThreadHandle) -> ThreadResult<()> {
    handle
        .native
        .take()
        .map(drop)
        .ok_or(ThreadError::NotJoinable)
}

/// Handle for the calling thread. Carries no join handle; identifier
/// queries and equality only.
pub fn current() -> ThreadHandle {
    ThreadHandle {
        id: std::thread::current().id(),
        native: None,
    }
}

/// Identifier of the calling thread.
pub fn id() -> ThreadId {
    std::thread::current().id()
}

/// Blocks the calling thread for at least `duration`.
pub fn sleep(duration: Duration) {
    std::thread::sleep(duration);
}

/// Offers the remainder of the time slice to the scheduler.
pub fn yield_now() {
    std::thread::yield_now();
}

/// Number of hardware threads, or 0 when the OS reports nothing.
pub fn hardware_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(0)
}

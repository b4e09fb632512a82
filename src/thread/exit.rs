/*!
 * Thread-exit Hooks
 * Per-thread callbacks the creation trampoline runs after the user
 * callback returns. The registry is guarded by the reserved
 * at-thread-exit entry of the named-lock table
 */

use crate::core::types::ThreadId;
use crate::table;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// Hook invoked on the exiting thread with its registration data.
pub type ExitHook = fn(*mut ());

struct Registry(UnsafeCell<Vec<(ThreadId, ExitHook, usize)>>);

unsafe impl Sync for Registry {}

// Fast-path flag so threads that never registered anything skip the
// table entirely.
static ANY_REGISTERED: AtomicBool = AtomicBool::new(false);
static REGISTRY: Registry = Registry(UnsafeCell::new(Vec::new()));

/// Registers `hook(data)` to run on the calling thread's trampoline once
/// its callback returns. Threads not created through this crate never run
/// their hooks.
///
/// # Safety
/// `data` must stay valid until the hook has run.
pub unsafe fn register_exit_hook(hook: ExitHook, data: *mut ()) {
    table::lock_at_thread_exit();
    unsafe {
        (*REGISTRY.0.get()).push((std::thread::current().id(), hook, data as usize));
    }
    ANY_REGISTERED.store(true, Ordering::Release);
    unsafe { table::unlock_at_thread_exit() };
}

/// Runs and removes the calling thread's hooks. Called by the creation
/// trampoline.
pub(crate) fn run_exit_hooks() {
    if !ANY_REGISTERED.load(Ordering::Acquire) {
        return;
    }

    let id = std::thread::current().id();
    let mut due = Vec::new();
    table::lock_at_thread_exit();
    unsafe {
        let entries = &mut *REGISTRY.0.get();
        let mut at = 0;
        while at < entries.len() {
            if entries[at].0 == id {
                due.push(entries.swap_remove(at));
            } else {
                at += 1;
            }
        }
        table::unlock_at_thread_exit();
    }

    for (_, hook, data) in due {
        hook(data as *mut ());
    }
}

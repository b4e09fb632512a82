/*!
 * Core Types
 * Callback and identifier types shared across the support layer
 */

/// Start routine handed to [`crate::thread::create`]. Receives the caller's
/// opaque data pointer and returns the native exit code.
pub type ThreadProc = fn(*mut ()) -> u32;

/// Callback scheduled onto the worker pool. A panic unwinding out of the
/// callback is contained by the dispatching worker; the outstanding count
/// and host pin for that dispatch are still handed back.
pub type ChoreProc = fn(*mut ());

/// Native thread exit code.
pub type ExitCode = u32;

/// Thread identifier; thread handle equality is identifier equality.
pub type ThreadId = std::thread::ThreadId;

/*!
 * Platform Sync Library
 * Native synchronization and task-scheduling support layer: lock/condvar
 * backends behind a per-process selection ladder, thread primitives with
 * a creation handshake, a pooled chore scheduler with shutdown
 * accounting, and the process named-lock table
 */

pub mod compat;
pub mod core;
pub mod sync;
pub mod table;
pub mod task;
pub mod thread;

// Re-exports
pub use crate::core::errors::{TaskError, TaskResult, ThreadError, ThreadResult};
pub use crate::core::types::{ChoreProc, ExitCode, ThreadId, ThreadProc};
pub use compat::{mutex_delete, mutex_lock, mutex_new, mutex_unlock, CompatMutex};
pub use sync::{
    create_condvar, create_condvar_in, create_lock, create_lock_in, set_sync_api_mode,
    sync_api_mode, BackendKind, SyncApiMode, SyncCondvar, SyncLock,
};
pub use table::{ScopedLock, TableInit};
pub use task::{
    outstanding_tasks, release_chore, reschedule_chore, schedule_chore, set_host_lifetime, Chore,
    HostLifetime, HostStatus, ShutdownBlocker, StaticHost,
};
pub use thread::{register_exit_hook, ThreadHandle};

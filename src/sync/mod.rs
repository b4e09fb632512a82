/*!
 * Synchronization Backends
 * Uniform lock/condvar surface over the platform API tiers. The backend
 * is chosen once per primitive by the selection ladder in factory
 */

pub mod backend;
pub mod condvar;
pub mod factory;
pub mod lock;
pub mod mode;
pub mod probe;
pub mod recursive;
pub mod slim;

#[cfg(feature = "cooperative")]
pub mod cooperative;
#[cfg(unix)]
pub mod native;

// Re-export for convenience
pub use backend::{BackendKind, CondvarBackend, LockBackend};
pub use condvar::SyncCondvar;
pub use factory::{
    create_condvar, create_condvar_in, create_lock, create_lock_in, select_backend, Availability,
    CONDVAR_MAX_ALIGN, CONDVAR_MAX_SIZE, LOCK_MAX_ALIGN, LOCK_MAX_SIZE,
};
pub use lock::SyncLock;
pub use mode::{set_sync_api_mode, sync_api_mode, SyncApiMode};
pub use recursive::RecursiveLock;

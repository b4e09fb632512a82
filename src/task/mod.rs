/*!
 * Task Scheduling
 * Chores on the process worker pool, the outstanding-work counter that
 * holds teardown open, and host-lifetime pinning around dispatch
 */

pub mod chore;
pub mod host;
pub mod scheduler;
pub mod shutdown;

mod pool;

// Re-export for convenience
pub use chore::Chore;
pub use host::{set_host_lifetime, HostLifetime, HostStatus, StaticHost};
pub use scheduler::{release_chore, reschedule_chore, schedule_chore};
pub use shutdown::{outstanding_tasks, ShutdownBlocker};

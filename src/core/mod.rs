/*!
 * Core Module
 * Shared types and error handling
 */

pub mod errors;
pub mod types;

// Re-export for convenience
pub use errors::{TaskError, TaskResult, ThreadError, ThreadResult};
pub use types::{ChoreProc, ExitCode, ThreadId, ThreadProc};

/*!
 * Error Types
 * Centralized error handling for the thread and task surfaces
 */

use thiserror::Error;

/// Thread primitive errors
#[derive(Error, Debug)]
pub enum ThreadError {
    /// Native thread creation failed; no handshake was performed.
    #[error("failed to spawn native thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The thread terminated without producing an exit code.
    #[error("thread terminated abnormally before returning an exit code")]
    Terminated,

    /// The handle no longer owns a native thread to join or detach.
    #[error("thread handle is not joinable")]
    NotJoinable,
}

/// Task scheduling errors
#[derive(Error, Debug)]
pub enum TaskError {
    /// The chore already holds a work handle.
    #[error("chore is already scheduled")]
    AlreadyScheduled,

    /// The chore has no work handle to resubmit.
    #[error("chore is not scheduled")]
    NotScheduled,

    /// Legacy work handles are single-shot and cannot be resubmitted.
    #[error("legacy work handle cannot be resubmitted")]
    LegacyHandle,

    /// The pool or legacy queue could not accept the work item.
    #[error("failed to submit work item: {0}")]
    Submit(#[source] std::io::Error),
}

impl TaskError {
    /// Raw OS error code behind the failure, when the OS reported one.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            TaskError::Submit(err) => err.raw_os_error(),
            _ => None,
        }
    }
}

/// Result type for thread operations
pub type ThreadResult<T> = Result<T, ThreadError>;

/// Result type for task operations
pub type TaskResult<T> = Result<T, TaskError>;

/*!
 * Chores
 * The schedulable unit: a callback, its data pointer, and the native
 * work handle held while scheduled
 */

use crate::core::types::ChoreProc;
use std::sync::Arc;

/// Work object registered with the process pool. Each submission clones
/// the Arc into the run queue, so a released object stays alive until
/// every pending execution has dispatched.
pub(crate) struct WorkObject {
    pub(crate) chore: usize,
}

pub(crate) enum WorkHandle {
    /// Modern path: closable, resubmittable pool work object.
    Pool(Arc<WorkObject>),
    /// Legacy path: marker only, single-shot, nothing to close.
    Legacy,
}

/// Callback plus data, schedulable onto the process pool.
///
/// The embedder owns the chore and keeps it alive and in place from
/// `schedule` until the last submitted execution completes.
pub struct Chore {
    pub(crate) callback: ChoreProc,
    pub(crate) data: usize,
    pub(crate) work: Option<WorkHandle>,
}

impl Chore {
    pub fn new(callback: ChoreProc, data: *mut ()) -> Self {
        Self {
            callback,
            data: data as usize,
            work: None,
        }
    }

    /// Whether a work handle is currently held.
    pub fn is_scheduled(&self) -> bool {
        self.work.is_some()
    }
}

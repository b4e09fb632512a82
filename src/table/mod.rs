/*!
 * Named-Lock Table
 * Eight process-wide recursive mutexes indexed by lock kind, with
 * reference-counted initialization shared across every component that
 * links this layer into the process
 */

use crate::sync::RecursiveLock;
use log::debug;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::OnceLock;

/// Locale state domain.
pub const KIND_LOCALE: usize = 0;
/// Allocator bookkeeping domain.
pub const KIND_ALLOC: usize = 1;
/// Stream registry domain.
pub const KIND_STREAM: usize = 2;
/// Debug hook domain.
pub const KIND_DEBUG: usize = 3;
/// Reserved domain with direct lock/unlock functions, used around
/// thread-exit bookkeeping.
pub const KIND_AT_THREAD_EXIT: usize = 4;

const TABLE_SIZE: usize = 8;
const KIND_MASK: usize = TABLE_SIZE - 1;

struct Table {
    // Starts at the -1 sentinel: the transition to 0 initializes the
    // entries, the transition back below 0 destroys them.
    refs: AtomicIsize,
    entries: [UnsafeCell<MaybeUninit<RecursiveLock>>; TABLE_SIZE],
}

unsafe impl Sync for Table {}

#[allow(clippy::declare_interior_mutable_const)]
const VACANT: UnsafeCell<MaybeUninit<RecursiveLock>> = UnsafeCell::new(MaybeUninit::uninit());

static TABLE: Table = Table {
    refs: AtomicIsize::new(-1),
    entries: [VACANT; TABLE_SIZE],
};

/// Reference-counted initialization guard.
///
/// Every component embedding this layer holds one for as long as it may
/// touch the table; the first guard in the process builds the entries and
/// the last one tears them down. Guards must be constructed before
/// concurrent table use begins.
pub struct TableInit(());

impl TableInit {
    pub fn new() -> Self {
        if TABLE.refs.fetch_add(1, Ordering::SeqCst) == -1 {
            for slot in &TABLE.entries {
                unsafe { (*slot.get()).write(RecursiveLock::new()) };
            }
            debug!("named-lock table initialized");
        }
        TableInit(())
    }
}

impl Default for TableInit {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TableInit {
    fn drop(&mut self) {
        if TABLE.refs.fetch_sub(1, Ordering::SeqCst) == 0 {
            for slot in &TABLE.entries {
                unsafe { (*slot.get()).assume_init_drop() };
            }
            debug!("named-lock table destroyed");
        }
    }
}

/// Whether the table currently holds live entries.
pub fn is_initialized() -> bool {
    TABLE.refs.load(Ordering::SeqCst) >= 0
}

fn entry(kind: usize) -> &'static RecursiveLock {
    debug_assert!(
        is_initialized(),
        "named-lock table used with no TableInit alive"
    );
    unsafe { (*TABLE.entries[kind].get()).assume_init_ref() }
}

/// Scoped acquisition of one table entry, selected by kind masked into
/// range. Requires a live [`TableInit`].
pub struct ScopedLock {
    kind: usize,
}

impl ScopedLock {
    pub fn new(kind: usize) -> Self {
        let kind = kind & KIND_MASK;
        entry(kind).lock();
        ScopedLock { kind }
    }
}

impl Drop for ScopedLock {
    fn drop(&mut self) {
        unsafe { entry(self.kind).unlock() };
    }
}

// Internal users (exit hooks, the task runtime) reach the table outside
// any embedder's TableInit scope; their uses pin the table for the rest
// of the process, which is how the original static registration behaves.
fn ensure_process_guard() {
    static PROCESS_GUARD: OnceLock<TableInit> = OnceLock::new();
    PROCESS_GUARD.get_or_init(TableInit::new);
}

/// Locks the reserved at-thread-exit entry, initializing the table for
/// the remaining process lifetime if no guard is alive yet.
pub fn lock_at_thread_exit() {
    ensure_process_guard();
    entry(KIND_AT_THREAD_EXIT).lock();
}

/// Unlocks the reserved at-thread-exit entry.
///
/// # Safety
/// The calling thread must hold it via [`lock_at_thread_exit`].
pub unsafe fn unlock_at_thread_exit() {
    unsafe { entry(KIND_AT_THREAD_EXIT).unlock() };
}

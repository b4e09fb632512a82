/*!
 * Backend Factory
 * The selection ladder and the storage constructors
 */

use super::backend::BackendKind;
use super::condvar::{CondvarImpl, SyncCondvar};
use super::lock::{LockImpl, SyncLock};
use super::mode::{sync_api_mode, SyncApiMode};
use super::probe;
use super::slim::{SlimCondvar, SlimLock};
use log::{error, trace};

#[cfg(feature = "cooperative")]
use super::cooperative::{CoopCondvar, CoopLock};
#[cfg(unix)]
use super::native::{NativeCondvar, NativeLock};

/// Lock storage footprint, for embedders reserving opaque space.
pub const LOCK_MAX_SIZE: usize = std::mem::size_of::<SyncLock>();
/// Lock storage alignment.
pub const LOCK_MAX_ALIGN: usize = std::mem::align_of::<SyncLock>();
/// Condvar storage footprint.
pub const CONDVAR_MAX_SIZE: usize = std::mem::size_of::<SyncCondvar>();
/// Condvar storage alignment.
pub const CONDVAR_MAX_ALIGN: usize = std::mem::align_of::<SyncCondvar>();

/// Tier availability snapshot the ladder walks over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub slim: bool,
    pub native: bool,
}

impl Availability {
    /// Reads the live probes, including any fault-injection overrides.
    pub fn detect() -> Self {
        Self {
            slim: probe::slim_available(),
            native: probe::native_available(),
        }
    }
}

const LADDER: [BackendKind; 3] = [
    BackendKind::Slim,
    BackendKind::Native,
    BackendKind::Cooperative,
];

/// Walks the ladder downward from the mode's entry tier and returns the
/// first available backend, or `None` when every remaining tier is out.
pub fn select_backend(mode: SyncApiMode, avail: Availability) -> Option<BackendKind> {
    let entry = match mode {
        SyncApiMode::Normal | SyncApiMode::Slim => 0,
        SyncApiMode::Native => 1,
        SyncApiMode::Cooperative => 2,
    };
    for kind in &LADDER[entry..] {
        let available = match kind {
            BackendKind::Slim => avail.slim,
            BackendKind::Native => avail.native,
            BackendKind::Cooperative => cfg!(feature = "cooperative"),
        };
        if available {
            return Some(*kind);
        }
    }
    None
}

fn selected_backend() -> BackendKind {
    // The constrained build always takes the slim tier, no probing.
    if cfg!(feature = "slim_only") {
        return BackendKind::Slim;
    }
    let mode = sync_api_mode();
    match select_backend(mode, Availability::detect()) {
        Some(kind) => {
            trace!("backend selected: {} (mode {:?})", kind.name(), mode);
            kind
        }
        None => {
            error!("no synchronization backend available under mode {:?}", mode);
            std::process::abort();
        }
    }
}

fn make_lock(kind: BackendKind) -> LockImpl {
    match kind {
        BackendKind::Slim => LockImpl::Slim(SlimLock::new()),
        #[cfg(unix)]
        BackendKind::Native => LockImpl::Native(NativeLock::new()),
        #[cfg(not(unix))]
        BackendKind::Native => unreachable!("native tier is never selected off-unix"),
        #[cfg(feature = "cooperative")]
        BackendKind::Cooperative => LockImpl::Cooperative(CoopLock::new()),
        #[cfg(not(feature = "cooperative"))]
        BackendKind::Cooperative => unreachable!("cooperative tier is not compiled in"),
    }
}

fn make_condvar(kind: BackendKind) -> CondvarImpl {
    match kind {
        BackendKind::Slim => CondvarImpl::Slim(SlimCondvar::new()),
        #[cfg(unix)]
        BackendKind::Native => CondvarImpl::Native(NativeCondvar::new()),
        #[cfg(not(unix))]
        BackendKind::Native => unreachable!("native tier is never selected off-unix"),
        #[cfg(feature = "cooperative")]
        BackendKind::Cooperative => CondvarImpl::Cooperative(CoopCondvar::new()),
        #[cfg(not(feature = "cooperative"))]
        BackendKind::Cooperative => unreachable!("cooperative tier is not compiled in"),
    }
}

/// Builds a lock with the backend the ladder selects right now.
pub fn create_lock() -> SyncLock {
    SyncLock::from_impl(make_lock(selected_backend()))
}

/// Builds a condition variable with the backend the ladder selects right
/// now. Pair it only with locks created under the same selection.
pub fn create_condvar() -> SyncCondvar {
    SyncCondvar::from_impl(make_condvar(selected_backend()))
}

/// Placement form of [`create_lock`] for embedders that reserve opaque
/// storage ([`LOCK_MAX_SIZE`]/[`LOCK_MAX_ALIGN`]).
///
/// # Safety
/// `slot` must be valid for writes and properly aligned, and the written
/// lock must be destroyed (or dropped in place) exactly once.
pub unsafe fn create_lock_in(slot: *mut SyncLock) {
    unsafe { slot.write(create_lock()) };
}

/// Placement form of [`create_condvar`].
///
/// # Safety
/// `slot` must be valid for writes and properly aligned, and the written
/// condvar must be destroyed (or dropped in place) exactly once.
pub unsafe fn create_condvar_in(slot: *mut SyncCondvar) {
    unsafe { slot.write(create_condvar()) };
}

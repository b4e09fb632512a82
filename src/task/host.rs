/*!
 * Host Lifetime
 * Injectable pinning capability that keeps a dynamically loaded host
 * alive while scheduled callbacks may still run. The default host is the
 * executable itself, where process teardown already waits for
 * outstanding work and every pin is a no-op
 */

use parking_lot::RwLock;

/// What kind of binary hosts this copy of the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    /// Statically linked into the executable.
    Executable,
    /// Hosted in a dynamically loaded library.
    SharedLibrary,
    /// Indeterminate. Pinned like a shared library, counted like an
    /// executable.
    Unknown,
}

/// Pinning capability the scheduler drives around each dispatch.
pub trait HostLifetime: Send + Sync {
    fn status(&self) -> HostStatus;

    /// Takes a host reference keyed by the callback's code address, so
    /// the host cannot unload while that dispatch is outstanding.
    fn pin(&self, callback: usize);

    /// Returns a [`pin`](Self::pin) reference once the dispatch is done
    /// with it.
    fn unpin(&self, callback: usize);

    /// Pins the host for the remaining process lifetime. The legacy
    /// queue has no completion signal to release against.
    fn pin_permanent(&self, callback: usize);
}

/// Executable-hosted default: nothing can unload, nothing to pin.
pub struct StaticHost;

impl HostLifetime for StaticHost {
    fn status(&self) -> HostStatus {
        HostStatus::Executable
    }

    fn pin(&self, _callback: usize) {}
    fn unpin(&self, _callback: usize) {}
    fn pin_permanent(&self, _callback: usize) {}
}

static DEFAULT_HOST: StaticHost = StaticHost;
static HOST: RwLock<Option<&'static dyn HostLifetime>> = RwLock::new(None);

/// Installs the process host description. Loader shims call this before
/// any chore is scheduled; unset, the executable default applies.
pub fn set_host_lifetime(host: &'static dyn HostLifetime) {
    *HOST.write() = Some(host);
}

pub(crate) fn host() -> &'static dyn HostLifetime {
    (*HOST.read()).unwrap_or(&DEFAULT_HOST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_host_is_the_executable() {
        assert_eq!(host().status(), HostStatus::Executable);
    }
}

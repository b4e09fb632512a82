/*!
 * Capability Probes
 * Tier availability checks. Statically known on supported targets; the
 * override slots exist so tests can inject availability faults
 */

use std::sync::atomic::{AtomicU8, Ordering};

const UNSET: u8 = 0;
const FORCED_ON: u8 = 1;
const FORCED_OFF: u8 = 2;

static SLIM_OVERRIDE: AtomicU8 = AtomicU8::new(UNSET);
static NATIVE_OVERRIDE: AtomicU8 = AtomicU8::new(UNSET);
static POOL_OVERRIDE: AtomicU8 = AtomicU8::new(UNSET);

fn read(slot: &AtomicU8, detected: bool) -> bool {
    match slot.load(Ordering::Relaxed) {
        FORCED_ON => true,
        FORCED_OFF => false,
        _ => detected,
    }
}

fn write(slot: &AtomicU8, forced: Option<bool>) {
    let value = match forced {
        Some(true) => FORCED_ON,
        Some(false) => FORCED_OFF,
        None => UNSET,
    };
    slot.store(value, Ordering::Relaxed);
}

/// Whether the slim (parking-lot) lock family is usable.
#[inline]
pub fn slim_available() -> bool {
    read(&SLIM_OVERRIDE, true)
}

/// Whether the OS-native (pthread) objects are usable.
#[inline]
pub fn native_available() -> bool {
    read(&NATIVE_OVERRIDE, cfg!(unix))
}

/// Whether the process worker pool may take chores; when it may not,
/// scheduling falls back to the legacy serial queue.
#[inline]
pub fn pool_available() -> bool {
    read(&POOL_OVERRIDE, true)
}

/// Forces the slim probe result; `None` restores detection.
pub fn override_slim(forced: Option<bool>) {
    write(&SLIM_OVERRIDE, forced);
}

/// Forces the native probe result; `None` restores detection.
pub fn override_native(forced: Option<bool>) {
    write(&NATIVE_OVERRIDE, forced);
}

/// Forces the pool probe result; `None` restores detection.
pub fn override_pool(forced: Option<bool>) {
    write(&POOL_OVERRIDE, forced);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn overrides_shadow_detection_until_cleared() {
        override_slim(Some(false));
        assert!(!slim_available());
        override_slim(Some(true));
        assert!(slim_available());
        override_slim(None);
        assert!(slim_available());
    }
}

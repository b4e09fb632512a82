/*!
 * API Mode
 * Per-process entry point into the backend selection ladder. Set
 * programmatically, or through the SYNC_API_MODE environment variable
 * resolved once on first use
 */

use std::sync::atomic::{AtomicU8, Ordering};

/// Where the selection ladder starts for primitives constructed from now
/// on. Already-constructed primitives keep their backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncApiMode {
    /// Default: walk the ladder from the top.
    Normal,
    /// Start at the slim tier.
    Slim,
    /// Start at the native tier.
    Native,
    /// Start at the cooperative tier.
    Cooperative,
}

const MODE_UNSET: u8 = 0;
const MODE_NORMAL: u8 = 1;
const MODE_SLIM: u8 = 2;
const MODE_NATIVE: u8 = 3;
const MODE_COOPERATIVE: u8 = 4;

static MODE: AtomicU8 = AtomicU8::new(MODE_UNSET);

fn encode(mode: SyncApiMode) -> u8 {
    match mode {
        SyncApiMode::Normal => MODE_NORMAL,
        SyncApiMode::Slim => MODE_SLIM,
        SyncApiMode::Native => MODE_NATIVE,
        SyncApiMode::Cooperative => MODE_COOPERATIVE,
    }
}

fn decode(raw: u8) -> SyncApiMode {
    match raw {
        MODE_SLIM => SyncApiMode::Slim,
        MODE_NATIVE => SyncApiMode::Native,
        MODE_COOPERATIVE => SyncApiMode::Cooperative,
        _ => SyncApiMode::Normal,
    }
}

/// Sets the process-wide mode.
pub fn set_sync_api_mode(mode: SyncApiMode) {
    MODE.store(encode(mode), Ordering::Relaxed);
}

/// Current mode; resolves the environment override the first time it is
/// read with nothing set programmatically.
pub fn sync_api_mode() -> SyncApiMode {
    match MODE.load(Ordering::Relaxed) {
        MODE_UNSET => {
            let mode = mode_from_env();
            MODE.store(encode(mode), Ordering::Relaxed);
            mode
        }
        raw => decode(raw),
    }
}

fn mode_from_env() -> SyncApiMode {
    match std::env::var("SYNC_API_MODE").as_deref() {
        Ok("slim") => SyncApiMode::Slim,
        Ok("native") => SyncApiMode::Native,
        Ok("cooperative") => SyncApiMode::Cooperative,
        _ => SyncApiMode::Normal,
    }
}

//! Sync decision logic (spec.md §4.7) and the single-flight watchdog that
//! guards it.

use std::time::{Duration, Instant};

use ledger_chain::Chain;

use crate::session::PeerInfo;

/// Decide whether receiving `peer`'s `HELLO` should trigger a
/// `SYNC_REQUEST`. A sync always fires on connect — even at equal chain
/// length, the peer may hold unique `NODE_JOIN`s ours doesn't, which only
/// the unique-node merge inside sync handling can recover.
pub fn should_sync_on_hello(_local_chain: &Chain, _peer: &PeerInfo) -> bool {
    true
}

/// Single-flight sync guard with a hard watchdog (spec.md §4.7, §5):
/// `try_begin` fails if a sync is already outstanding and the watchdog
/// hasn't yet expired; `finish` always clears the flag.
pub struct SyncGuard {
    started_at: Option<Instant>,
    watchdog: Duration,
}

impl SyncGuard {
    pub fn new(watchdog: Duration) -> Self {
        Self {
            started_at: None,
            watchdog,
        }
    }

    pub fn is_syncing(&self) -> bool {
        match self.started_at {
            Some(start) => start.elapsed() < self.watchdog,
            None => false,
        }
    }

    /// Attempt to enter the syncing state. Returns `false` (and resets a
    /// stale flag) if a sync is already outstanding and hasn't timed out.
    pub fn try_begin(&mut self) -> bool {
        if self.is_syncing() {
            return false;
        }
        self.started_at = Some(Instant::now());
        true
    }

    pub fn finish(&mut self) {
        self.started_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_rejects_concurrent_sync() {
        let mut guard = SyncGuard::new(Duration::from_secs(30));
        assert!(guard.try_begin());
        assert!(!guard.try_begin());
        guard.finish();
        assert!(guard.try_begin());
    }

    #[test]
    fn watchdog_resets_a_stuck_flag() {
        let mut guard = SyncGuard::new(Duration::from_millis(1));
        assert!(guard.try_begin());
        std::thread::sleep(Duration::from_millis(5));
        assert!(guard.try_begin(), "expired watchdog should allow a new sync");
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot of receive-path counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReceiveStats {
    /// Notifications handled.
    pub received: u64,
    /// Frames decoded and queued.
    pub queued: u64,
    /// Frames discarded for a checksum mismatch.
    pub dropped_checksum: u64,
    /// Frames discarded for any other validation failure.
    pub dropped_invalid: u64,
    /// Decoded messages discarded because the queue was full.
    pub dropped_full: u64,
    /// Transport reads that failed.
    pub read_failures: u64,
}

#[derive(Debug, Default)]
pub(crate) struct ReceiveCounters {
    pub(crate) received: AtomicU64,
    pub(crate) queued: AtomicU64,
    pub(crate) dropped_checksum: AtomicU64,
    pub(crate) dropped_invalid: AtomicU64,
    pub(crate) dropped_full: AtomicU64,
    pub(crate) read_failures: AtomicU64,
}

impl ReceiveCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ReceiveStats {
        ReceiveStats {
            received: self.received.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            dropped_checksum: self.dropped_checksum.load(Ordering::Relaxed),
            dropped_invalid: self.dropped_invalid.load(Ordering::Relaxed),
            dropped_full: self.dropped_full.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
        }
    }
}

impl ReceiveStats {
    /// Frames discarded for any reason.
    pub fn dropped(&self) -> u64 {
        self.dropped_checksum + self.dropped_invalid + self.dropped_full + self.read_failures
    }
}

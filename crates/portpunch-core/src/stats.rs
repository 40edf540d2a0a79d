//! Verdict Statistics
//!
//! Lock-free counters, recorded next to (never inside) classification.

use crate::verdict::Verdict;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-verdict counters (cache-line aligned)
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct VerdictStats {
    packets: AtomicU64,
    bytes: AtomicU64,
    by_verdict: [AtomicU64; 5],
}

impl VerdictStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one classified packet
    #[inline(always)]
    pub fn record(&self, verdict: Verdict, bytes: usize) {
        self.packets.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        self.by_verdict[verdict.action_code() as usize].fetch_add(1, Ordering::Relaxed);
    }

    /// Packets recorded with `verdict`
    pub fn count(&self, verdict: Verdict) -> u64 {
        self.by_verdict[verdict.action_code() as usize].load(Ordering::Relaxed)
    }

    /// Point-in-time copy
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            packets: self.packets.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            pass: self.count(Verdict::Pass),
            drop: self.count(Verdict::Drop),
            redirect: self.count(Verdict::Redirect),
            transmit: self.count(Verdict::Transmit),
            abort: self.count(Verdict::Abort),
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.packets.store(0, Ordering::Relaxed);
        self.bytes.store(0, Ordering::Relaxed);
        for counter in &self.by_verdict {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Stats snapshot (non-atomic)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Packets classified
    pub packets: u64,
    /// Bytes classified
    pub bytes: u64,
    /// Passed
    pub pass: u64,
    /// Dropped
    pub drop: u64,
    /// Redirected
    pub redirect: u64,
    /// Transmitted back out
    pub transmit: u64,
    /// Aborted
    pub abort: u64,
}

impl StatsSnapshot {
    /// Share of packets dropped
    pub fn drop_rate(&self) -> f64 {
        if self.packets == 0 {
            return 0.0;
        }
        self.drop as f64 / self.packets as f64
    }
}

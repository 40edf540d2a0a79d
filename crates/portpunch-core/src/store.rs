//! Lock-free policy store with hot-swapping

use crate::policy::{Decision, Policy};
use crate::stats::VerdictStats;
use crate::verdict::Verdict;
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Shared, atomically replaceable policy.
///
/// Readers load a snapshot per packet; [`PolicyStore::replace`] publishes a
/// whole new policy, so a classification never sees a half-updated rule table.
pub struct PolicyStore {
    /// Current policy (atomically swappable)
    policy: ArcSwap<Policy>,
    /// Bumped on every replace
    version: AtomicU64,
    stats: VerdictStats,
}

impl PolicyStore {
    /// Create with initial policy
    pub fn new(policy: Policy) -> Self {
        info!(
            rules = policy.rules().len(),
            default_verdict = %policy.default_verdict(),
            "policy installed"
        );
        Self {
            policy: ArcSwap::from_pointee(policy),
            version: AtomicU64::new(1),
            stats: VerdictStats::new(),
        }
    }

    /// Current version
    #[inline(always)]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Classify against the current policy and count the verdict
    #[inline]
    pub fn classify(&self, packet: &[u8]) -> Verdict {
        let verdict = self.policy.load().classify(packet);
        self.stats.record(verdict, packet.len());
        verdict
    }

    /// Like [`PolicyStore::classify`], with the reason
    pub fn decide(&self, packet: &[u8]) -> Decision {
        let decision = self.policy.load().decide(packet);
        self.stats.record(decision.verdict, packet.len());
        decision
    }

    /// Atomically publish a new policy, returns the new version
    pub fn replace(&self, policy: Policy) -> u64 {
        let rules = policy.rules().len();
        let default_verdict = policy.default_verdict();
        self.policy.store(Arc::new(policy));
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        info!(version, rules, default_verdict = %default_verdict, "policy replaced");
        version
    }

    /// Current policy (for inspection)
    pub fn current(&self) -> Arc<Policy> {
        self.policy.load_full()
    }

    /// Verdict counters
    pub fn stats(&self) -> &VerdictStats {
        &self.stats
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new(Policy::default())
    }
}

//! Diagnostic counters kept by the cache manager.

use serde::Serialize;

/// Hit and lifecycle counters. Diagnostic only; nothing reads them back.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalkabilityStats {
    /// Walkability checks issued through the manager.
    pub walkability_requests: u64,
    /// Walkability checks whose region was already cached.
    pub walkability_cache_hits: u64,
    /// Floor lookups issued through the manager.
    pub floor_requests: u64,
    /// Floor lookups answered from a floor memo.
    pub floor_cache_hits: u64,
    /// Caches kept by `post_update` although unused this frame.
    pub preserved_floor_caches: u64,
    /// Caches returned to the pool by `post_update`.
    pub evicted_caches: u64,
}

impl WalkabilityStats {
    /// Fraction of walkability checks that hit, or zero before any request.
    #[must_use]
    pub fn walkability_hit_rate(&self) -> f64 {
        ratio(self.walkability_cache_hits, self.walkability_requests)
    }

    /// Fraction of floor lookups that hit, or zero before any request.
    #[must_use]
    pub fn floor_hit_rate(&self) -> f64 {
        ratio(self.floor_cache_hits, self.floor_requests)
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "Counters are diagnostic; precision loss past 2^53 is irrelevant."
)]
fn ratio(hits: u64, requests: u64) -> f64 {
    if requests == 0 {
        0.0
    } else {
        hits as f64 / requests as f64
    }
}

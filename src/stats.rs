//! Aggregate statistics for the read manager.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Monotonically accumulating counters for read manager activity.
///
/// Counters reset only when the manager is reconstructed. [`BatchReadManager::stats`]
/// returns a value copy, so holders of a snapshot cannot mutate the live
/// counters.
///
/// [`BatchReadManager::stats`]: crate::BatchReadManager::stats
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadStats {
    /// Requests that completed with a successfully fetched value (both lanes).
    pub total_requests: u64,
    /// Requests that went through a batch dispatch cycle.
    pub batched_requests: u64,
    /// Requests served from the cache without any network access.
    pub cache_hits: u64,
    /// Requests that missed the cache and required a fetch.
    pub cache_misses: u64,
    /// Requests rejected with an error (either lane).
    pub failed_requests: u64,
    /// Number of batch dispatch cycles executed.
    pub dispatches: u64,
    /// Running average latency across all historical dispatch cycles.
    pub avg_dispatch_latency: Duration,
}

impl ReadStats {
    /// Cache hit rate as a percentage (0.0 to 100.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            (self.cache_hits as f64 / total as f64) * 100.0
        }
    }

    /// Folds one dispatch cycle's latency into the running average.
    pub(crate) fn record_dispatch(&mut self, latency: Duration) {
        self.dispatches += 1;
        let n = self.dispatches as f64;
        let previous = self.avg_dispatch_latency.as_secs_f64();
        self.avg_dispatch_latency =
            Duration::from_secs_f64(previous + (latency.as_secs_f64() - previous) / n);
    }
}

impl fmt::Display for ReadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={}, batched={}, hits={}, misses={}, failed={}, dispatches={}, avg_dispatch={:?}, hit_rate={:.1}%",
            self.total_requests,
            self.batched_requests,
            self.cache_hits,
            self.cache_misses,
            self.failed_requests,
            self.dispatches,
            self.avg_dispatch_latency,
            self.hit_rate()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_empty_is_zero() {
        assert_eq!(ReadStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_percentage() {
        let stats = ReadStats {
            cache_hits: 3,
            cache_misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 75.0);
    }

    #[test]
    fn test_running_average_over_dispatches() {
        let mut stats = ReadStats::default();
        stats.record_dispatch(Duration::from_millis(100));
        assert_eq!(stats.avg_dispatch_latency, Duration::from_millis(100));

        stats.record_dispatch(Duration::from_millis(300));
        assert_eq!(stats.dispatches, 2);
        // (100 + 300) / 2
        let avg_ms = stats.avg_dispatch_latency.as_secs_f64() * 1000.0;
        assert!((avg_ms - 200.0).abs() < 1.0, "avg was {avg_ms}ms");
    }
}

//! Tunables for the read manager.

use std::time::Duration;

/// Default debounce window between the first enqueue and batch dispatch.
const DEFAULT_DEBOUNCE_MS: u64 = 10;
/// Default maximum number of requests drained per dispatch cycle.
const DEFAULT_MAX_BATCH_SIZE: usize = 50;
/// Priorities strictly above this value take the immediate lane.
const DEFAULT_IMMEDIATE_THRESHOLD: i32 = 5;
/// Default time-to-live for cached read results (30 seconds).
const DEFAULT_TTL_SECS: u64 = 30;
/// Priority used by preloads: below the default 0 so warm-ups never preempt
/// real requests.
const DEFAULT_PRELOAD_PRIORITY: i32 = -1;
/// Default bound on pending batched requests.
const DEFAULT_MAX_QUEUE_LEN: usize = 10_000;

/// Configuration for a [`BatchReadManager`](crate::BatchReadManager).
///
/// # Example
///
/// ```rust
/// use batchread::ManagerConfig;
/// use std::time::Duration;
///
/// let config = ManagerConfig::default()
///     .with_debounce(Duration::from_millis(25))
///     .with_max_batch_size(100);
/// ```
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Idle window between the first enqueue and the batch dispatch firing.
    /// Further enqueues during the window do not reschedule it.
    pub debounce: Duration,
    /// Maximum requests drained per dispatch cycle; the rest stay queued for
    /// the next cycle.
    pub max_batch_size: usize,
    /// Requests with priority strictly above this skip the batch queue.
    pub immediate_priority_threshold: i32,
    /// TTL applied to cached results when the request doesn't specify one.
    pub default_ttl: Duration,
    /// Priority assigned to preload requests without explicit options.
    pub preload_priority: i32,
    /// Bound on pending batched requests; `call` fails fast with
    /// `QueueFull` beyond it.
    pub max_queue_len: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            immediate_priority_threshold: DEFAULT_IMMEDIATE_THRESHOLD,
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            preload_priority: DEFAULT_PRELOAD_PRIORITY,
            max_queue_len: DEFAULT_MAX_QUEUE_LEN,
        }
    }
}

impl ManagerConfig {
    /// Sets the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the maximum batch size per dispatch cycle.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Sets the default cache TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Sets the bound on pending batched requests.
    pub fn with_max_queue_len(mut self, max_queue_len: usize) -> Self {
        self.max_queue_len = max_queue_len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.debounce, Duration::from_millis(10));
        assert_eq!(config.max_batch_size, 50);
        assert_eq!(config.immediate_priority_threshold, 5);
        assert_eq!(config.default_ttl, Duration::from_secs(30));
        assert!(config.preload_priority < 0);
        assert_eq!(config.max_queue_len, 10_000);
    }

    #[test]
    fn test_builders() {
        let config = ManagerConfig::default()
            .with_debounce(Duration::from_millis(5))
            .with_max_batch_size(8)
            .with_default_ttl(Duration::from_secs(1))
            .with_max_queue_len(100);
        assert_eq!(config.debounce, Duration::from_millis(5));
        assert_eq!(config.max_batch_size, 8);
        assert_eq!(config.default_ttl, Duration::from_secs(1));
        assert_eq!(config.max_queue_len, 100);
    }
}

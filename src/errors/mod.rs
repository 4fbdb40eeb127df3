//! Error types for the batchread library.
//!
//! Each concern has its own error type for fine-grained handling, plus a
//! unified [`BatchReadError`] for callers that don't need to distinguish
//! error sources:
//!
//! - [`ReadError`] - a chain read failed (single call, transport, or codec)
//! - [`BatchReadError`] - everything the read manager can surface, including
//!   manager-level conditions like an unattached client or a full queue
//!
//! `ReadError` converts into `BatchReadError` via `From`, so `?` propagates
//! naturally.

mod read;

pub use read::ReadError;

/// Unified error type for all read manager operations.
///
/// Cache misses are internal and never surfaced as errors; they only trigger
/// a fetch. Failures are never retried inside the manager - retry policy
/// belongs to the caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BatchReadError {
    /// The manager was used before a chain client was attached.
    ///
    /// Surfaced immediately; the request is never queued.
    #[error("read manager used before a chain client was attached")]
    NotInitialized,

    /// The batch queue reached its configured bound.
    ///
    /// The request was rejected before enqueueing; nothing already accepted
    /// is ever shed.
    #[error("batch queue is full ({pending} requests pending)")]
    QueueFull {
        /// Number of requests pending at rejection time.
        pending: usize,
    },

    /// A chain read failed.
    #[error("read failed: {0}")]
    Read(#[from] ReadError),
}

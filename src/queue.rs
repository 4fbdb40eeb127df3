//! Priority-ordered queue of pending batched reads.
//!
//! Requests wait here between enqueue and the next debounced dispatch. The
//! queue is ordered by descending priority with arrival order breaking ties,
//! and is drained from the front in fixed-size batches.

use std::time::Instant;

use alloy_dyn_abi::DynSolValue;
use alloy_eips::BlockId;
use tokio::sync::oneshot;

use crate::call::CallDescriptor;
use crate::errors::ReadError;

/// A read waiting for the next batch dispatch.
///
/// Settled exactly once: the dispatch cycle either resolves or rejects the
/// `tx` slot. Requests cannot be withdrawn once enqueued.
#[derive(Debug)]
pub(crate) struct PendingRead {
    pub call: CallDescriptor,
    pub priority: i32,
    pub enqueued_at: Instant,
    /// Block tag the caller asked for; used for cache keying only, the
    /// multicall itself always reads latest state.
    pub block: Option<BlockId>,
    /// Skip the cache store for this request's result.
    pub bypass_cache: bool,
    /// Completion slot for the awaiting caller.
    pub tx: oneshot::Sender<Result<Vec<DynSolValue>, ReadError>>,
}

/// Ordered sequence of pending reads, highest priority first.
#[derive(Debug, Default)]
pub(crate) struct BatchQueue {
    items: Vec<PendingRead>,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a request at its priority rank.
    ///
    /// The request lands before the first existing entry with strictly lower
    /// priority, so equal priorities keep arrival order.
    pub fn push(&mut self, request: PendingRead) {
        let position = self
            .items
            .iter()
            .position(|pending| pending.priority < request.priority)
            .unwrap_or(self.items.len());
        self.items.insert(position, request);
    }

    /// Removes and returns up to `max` requests from the front.
    pub fn drain(&mut self, max: usize) -> Vec<PendingRead> {
        let count = max.min(self.items.len());
        self.items.drain(..count).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

//! The chain read collaborator consumed by the read manager.
//!
//! [`ChainReadClient`] is the seam between the batching/caching layer and the
//! actual RPC plumbing: a single-call primitive for the immediate lane and a
//! multicall primitive for batch dispatch. [`AlloyReadClient`] is the stock
//! implementation over an Alloy provider; tests substitute their own.

use alloy_dyn_abi::DynSolValue;
use alloy_eips::BlockId;
use async_trait::async_trait;

use crate::call::CallDescriptor;
use crate::errors::ReadError;

mod alloy;

pub use alloy::{AlloyReadClient, MULTICALL3_ADDRESS};

/// Per-call result slot of a multicall.
///
/// A multicall that partially fails still reports one outcome per input call:
/// successes carry their decoded value, failures carry the per-call error.
#[derive(Debug, Clone)]
pub enum CallOutcome {
    /// The call succeeded; decoded return values in output order.
    Success(Vec<DynSolValue>),
    /// The call failed or reverted; the error is scoped to this slot only.
    Failure(ReadError),
}

impl CallOutcome {
    /// Whether this slot succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }
}

/// A client able to execute contract reads against a chain.
///
/// # Contract
///
/// `read_many` must return exactly one [`CallOutcome`] per input call, in the
/// same order as `calls`. An `Err` return means the transport itself failed
/// and no per-call outcomes exist.
///
/// # Thread safety
///
/// Implementations are shared across the manager's dispatch tasks and must be
/// thread-safe.
#[async_trait]
pub trait ChainReadClient: Send + Sync + 'static {
    /// Executes a single read, optionally scoped to a block tag.
    ///
    /// Used by the immediate lane; never batched.
    async fn read_one(
        &self,
        call: &CallDescriptor,
        block: Option<BlockId>,
    ) -> Result<Vec<DynSolValue>, ReadError>;

    /// Executes several reads in one round trip.
    ///
    /// Returns one outcome per call, positionally aligned with `calls`.
    async fn read_many(&self, calls: &[CallDescriptor]) -> Result<Vec<CallOutcome>, ReadError>;
}

#[async_trait]
impl<T: ChainReadClient + ?Sized> ChainReadClient for std::sync::Arc<T> {
    async fn read_one(
        &self,
        call: &CallDescriptor,
        block: Option<BlockId>,
    ) -> Result<Vec<DynSolValue>, ReadError> {
        (**self).read_one(call, block).await
    }

    async fn read_many(&self, calls: &[CallDescriptor]) -> Result<Vec<CallOutcome>, ReadError> {
        (**self).read_many(calls).await
    }
}

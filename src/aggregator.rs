//! Yield aggregation across protocol contracts.
//!
//! A worked consumer of the read manager: tracks a registry of yield-bearing
//! protocol contracts exposing `getYield(address)` and `getName()`, and sums
//! a user's yield across all of them. The per-protocol reads go through the
//! batched lane, so N protocols cost one multicall round trip.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::call::{CallDescriptor, CallOptions};
use crate::client::ChainReadClient;
use crate::errors::{BatchReadError, ReadError};
use crate::manager::BatchReadManager;

const GET_YIELD_SIGNATURE: &str = "getYield(address)(uint256)";
const GET_NAME_SIGNATURE: &str = "getName()(string)";

/// Aggregates yield figures from a set of protocol contracts.
///
/// Each protocol must expose `getYield(address user) -> uint256` and
/// `getName() -> string`.
pub struct YieldAggregator<C: ChainReadClient> {
    manager: Arc<BatchReadManager<C>>,
    protocols: Mutex<Vec<Address>>,
}

impl<C: ChainReadClient> YieldAggregator<C> {
    /// Creates an aggregator with an empty protocol registry.
    pub fn new(manager: Arc<BatchReadManager<C>>) -> Self {
        Self {
            manager,
            protocols: Mutex::new(Vec::new()),
        }
    }

    /// Adds a protocol to track. Idempotent: adding a tracked protocol is a
    /// no-op.
    pub async fn add_protocol(&self, protocol: Address) {
        let mut protocols = self.protocols.lock().await;
        if !protocols.contains(&protocol) {
            debug!(%protocol, "tracking protocol");
            protocols.push(protocol);
        }
    }

    /// Removes a protocol from tracking. No-op if it was not tracked.
    pub async fn remove_protocol(&self, protocol: Address) {
        let mut protocols = self.protocols.lock().await;
        protocols.retain(|tracked| *tracked != protocol);
    }

    /// Whether a protocol is currently tracked.
    pub async fn is_tracked(&self, protocol: Address) -> bool {
        self.protocols.lock().await.contains(&protocol)
    }

    /// The tracked protocols, in registration order.
    pub async fn protocols(&self) -> Vec<Address> {
        self.protocols.lock().await.clone()
    }

    /// Number of tracked protocols.
    pub async fn protocol_count(&self) -> usize {
        self.protocols.lock().await.len()
    }

    /// Total yield for `user` across every tracked protocol.
    ///
    /// Issues all protocol reads concurrently on the batched lane (one
    /// multicall round trip) and sums the results. Fails on the first
    /// protocol whose read fails; use
    /// [`protocol_yields`](Self::protocol_yields) for partial results.
    pub async fn total_yield(&self, user: Address) -> Result<U256, BatchReadError> {
        let mut total = U256::ZERO;
        for (protocol, result) in self.protocol_yields(user).await {
            let amount = result?;
            debug!(%protocol, %amount, "protocol yield");
            total = total.saturating_add(amount);
        }
        Ok(total)
    }

    /// Per-protocol yield for `user`, one outcome per tracked protocol.
    pub async fn protocol_yields(
        &self,
        user: Address,
    ) -> Vec<(Address, Result<U256, BatchReadError>)> {
        let protocols = self.protocols.lock().await.clone();
        let reads = protocols.into_iter().map(|protocol| async move {
            let result = self.read_yield(protocol, user).await;
            (protocol, result)
        });
        join_all(reads).await
    }

    /// Display name of a protocol, read through the cache.
    pub async fn protocol_name(&self, protocol: Address) -> Result<String, BatchReadError> {
        let call = CallDescriptor::parse(protocol, GET_NAME_SIGNATURE, vec![])?;
        let output = self.manager.call(call, CallOptions::default()).await?;
        match output.first() {
            Some(DynSolValue::String(name)) => Ok(name.clone()),
            _ => Err(ReadError::decode_msg("getName", "expected string return").into()),
        }
    }

    async fn read_yield(
        &self,
        protocol: Address,
        user: Address,
    ) -> Result<U256, BatchReadError> {
        let call = CallDescriptor::parse(
            protocol,
            GET_YIELD_SIGNATURE,
            vec![DynSolValue::Address(user)],
        )?;
        let output = self.manager.call(call, CallOptions::default()).await?;
        output
            .first()
            .and_then(|value| value.as_uint())
            .map(|(amount, _)| amount)
            .ok_or_else(|| ReadError::decode_msg("getYield", "expected uint256 return").into())
    }
}

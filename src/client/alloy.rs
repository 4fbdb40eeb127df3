// SPDX-FileCopyrightText: 2025 Batchread Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Alloy-backed chain read client.
//!
//! `read_one` issues a plain `eth_call`; `read_many` packs every call into a
//! single Multicall3 `aggregate3` with `allowFailure = true`, so one slot
//! reverting never poisons its neighbours. Calls are encoded dynamically from
//! the request's ABI fragment, no generated bindings required.

use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_eips::BlockId;
use alloy_primitives::{address, Address, Bytes};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::{CallOutcome, ChainReadClient};
use crate::call::CallDescriptor;
use crate::errors::ReadError;

/// Canonical Multicall3 deployment, identical on all major EVM chains.
///
/// Contract: 0xcA11bde05977b3631167028862bE2a173976CA11
pub const MULTICALL3_ADDRESS: Address = address!("ca11bde05977b3631167028862be2a173976ca11");

sol! {
    /// Read-only subset of the Multicall3 interface.
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) external payable returns (Result[] memory returnData);
    }
}

/// Chain read client over an Alloy provider.
///
/// # Example
///
/// ```rust,ignore
/// use alloy_provider::ProviderBuilder;
/// use batchread::AlloyReadClient;
///
/// let provider = ProviderBuilder::new().connect_http("https://eth.llamarpc.com".parse()?);
/// let client = AlloyReadClient::new(provider);
/// ```
#[derive(Debug, Clone)]
pub struct AlloyReadClient<P> {
    provider: P,
    multicall: Address,
}

impl<P> AlloyReadClient<P> {
    /// Creates a client using the canonical Multicall3 deployment.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            multicall: MULTICALL3_ADDRESS,
        }
    }

    /// Overrides the Multicall3 address, for chains with a non-standard
    /// deployment.
    pub fn with_multicall_address(mut self, multicall: Address) -> Self {
        self.multicall = multicall;
        self
    }
}

fn encode_call(call: &CallDescriptor) -> Result<Vec<u8>, ReadError> {
    call.function
        .abi_encode_input(&call.args)
        .map_err(|e| ReadError::encode(call.function_name(), e))
}

#[async_trait]
impl<P> ChainReadClient for AlloyReadClient<P>
where
    P: Provider + 'static,
{
    async fn read_one(
        &self,
        call: &CallDescriptor,
        block: Option<BlockId>,
    ) -> Result<Vec<DynSolValue>, ReadError> {
        let calldata = encode_call(call)?;
        let tx = TransactionRequest::default()
            .to(call.address)
            .input(Bytes::from(calldata).into());

        let mut eth_call = self.provider.call(tx);
        if let Some(block) = block {
            eth_call = eth_call.block(block);
        }
        let data = eth_call
            .await
            .map_err(|e| ReadError::call_failed(call.address, call.function_name(), e))?;

        debug!(
            address = %call.address,
            function = call.function_name(),
            "single read completed"
        );
        call.function
            .abi_decode_output(&data)
            .map_err(|e| ReadError::decode(call.function_name(), e))
    }

    async fn read_many(&self, calls: &[CallDescriptor]) -> Result<Vec<CallOutcome>, ReadError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let mut packed = Vec::with_capacity(calls.len());
        for call in calls {
            packed.push(IMulticall3::Call3 {
                target: call.address,
                allowFailure: true,
                callData: encode_call(call)?.into(),
            });
        }

        let calldata = IMulticall3::aggregate3Call { calls: packed }.abi_encode();
        let tx = TransactionRequest::default()
            .to(self.multicall)
            .input(Bytes::from(calldata).into());

        let data = self
            .provider
            .call(tx)
            .await
            .map_err(|e| ReadError::transport("multicall aggregate3", e))?;
        let results = IMulticall3::aggregate3Call::abi_decode_returns(&data)
            .map_err(|e| ReadError::transport("multicall aggregate3", e))?;

        if results.len() != calls.len() {
            return Err(ReadError::transport_msg(
                "multicall aggregate3",
                format!("expected {} result slots, got {}", calls.len(), results.len()),
            ));
        }

        debug!(calls = calls.len(), "multicall completed");
        let outcomes = calls
            .iter()
            .zip(results)
            .map(|(call, slot)| {
                if !slot.success {
                    warn!(
                        address = %call.address,
                        function = call.function_name(),
                        "multicall slot reverted"
                    );
                    return CallOutcome::Failure(ReadError::call_failed_msg(
                        call.address,
                        call.function_name(),
                        "call reverted",
                    ));
                }
                match call.function.abi_decode_output(&slot.returnData) {
                    Ok(values) => CallOutcome::Success(values),
                    Err(e) => CallOutcome::Failure(ReadError::decode(call.function_name(), e)),
                }
            })
            .collect();
        Ok(outcomes)
    }
}

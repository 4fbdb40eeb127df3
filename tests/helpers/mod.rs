// SPDX-FileCopyrightText: 2025 Batchread Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for batchread integration tests
//!
//! Provides a scripted [`ChainReadClient`] so manager behavior can be tested
//! without real blockchain connections, and with full visibility into which
//! dispatches actually happened.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy_dyn_abi::DynSolValue;
use alloy_eips::BlockId;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use batchread::{CallDescriptor, CallOutcome, ChainReadClient, ReadError};

/// One recorded `read_many` invocation: the (address, function) of each call,
/// in the order they were supplied.
pub type RecordedMulticall = Vec<(Address, String)>;

/// Scripted chain read client.
///
/// Responds from a table keyed by (address, function name), records every
/// single read and every multicall, and can be told to fail individual calls
/// or whole addresses (transport-level).
#[derive(Default)]
pub struct MockChainReadClient {
    responses: Mutex<HashMap<(Address, String), Vec<DynSolValue>>>,
    failing_calls: Mutex<HashSet<(Address, String)>>,
    failing_addresses: Mutex<HashSet<Address>>,
    single_calls: AtomicUsize,
    multicalls: Mutex<Vec<RecordedMulticall>>,
}

impl MockChainReadClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the response for `function` on `address`.
    pub fn respond(&self, address: Address, function: &str, value: Vec<DynSolValue>) {
        self.responses
            .lock()
            .unwrap()
            .insert((address, function.to_string()), value);
    }

    /// Convenience: scripts a single uint256 response.
    pub fn respond_uint(&self, address: Address, function: &str, value: u64) {
        self.respond(
            address,
            function,
            vec![DynSolValue::Uint(U256::from(value), 256)],
        );
    }

    /// Makes one specific call fail at the per-call level.
    pub fn fail_call(&self, address: Address, function: &str) {
        self.failing_calls
            .lock()
            .unwrap()
            .insert((address, function.to_string()));
    }

    /// Makes every multicall touching `address` fail at the transport level.
    pub fn fail_address(&self, address: Address) {
        self.failing_addresses.lock().unwrap().insert(address);
    }

    /// Number of `read_one` invocations so far.
    pub fn single_call_count(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    /// Every `read_many` invocation so far, in order.
    pub fn multicalls(&self) -> Vec<RecordedMulticall> {
        self.multicalls.lock().unwrap().clone()
    }

    fn lookup(&self, address: Address, function: &str) -> Vec<DynSolValue> {
        self.responses
            .lock()
            .unwrap()
            .get(&(address, function.to_string()))
            .cloned()
            .unwrap_or_else(|| vec![DynSolValue::Uint(U256::ZERO, 256)])
    }
}

#[async_trait]
impl ChainReadClient for MockChainReadClient {
    async fn read_one(
        &self,
        call: &CallDescriptor,
        _block: Option<BlockId>,
    ) -> Result<Vec<DynSolValue>, ReadError> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);

        let target = (call.address, call.function_name().to_string());
        if self.failing_addresses.lock().unwrap().contains(&call.address) {
            return Err(ReadError::transport_msg("read_one", "scripted failure"));
        }
        if self.failing_calls.lock().unwrap().contains(&target) {
            return Err(ReadError::call_failed_msg(
                call.address,
                call.function_name(),
                "scripted failure",
            ));
        }
        Ok(self.lookup(call.address, call.function_name()))
    }

    async fn read_many(&self, calls: &[CallDescriptor]) -> Result<Vec<CallOutcome>, ReadError> {
        self.multicalls.lock().unwrap().push(
            calls
                .iter()
                .map(|call| (call.address, call.function_name().to_string()))
                .collect(),
        );

        let failing_addresses = self.failing_addresses.lock().unwrap().clone();
        if let Some(failing) = calls
            .iter()
            .find(|call| failing_addresses.contains(&call.address))
        {
            return Err(ReadError::transport_msg(
                "multicall aggregate3",
                format!("scripted transport failure for {}", failing.address),
            ));
        }

        let failing_calls = self.failing_calls.lock().unwrap().clone();
        Ok(calls
            .iter()
            .map(|call| {
                let target = (call.address, call.function_name().to_string());
                if failing_calls.contains(&target) {
                    CallOutcome::Failure(ReadError::call_failed_msg(
                        call.address,
                        call.function_name(),
                        "scripted failure",
                    ))
                } else {
                    CallOutcome::Success(self.lookup(call.address, call.function_name()))
                }
            })
            .collect())
    }
}

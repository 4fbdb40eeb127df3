// SPDX-FileCopyrightText: 2025 Batchread Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Errors for individual chain read operations.
//!
//! These errors are produced by [`ChainReadClient`](crate::ChainReadClient)
//! implementations and forwarded to callers by the read manager. A single
//! transport failure can reject every request sharing a multicall dispatch,
//! so the type is `Clone` and wraps its sources in `Arc`.

use std::sync::Arc;

use alloy_primitives::Address;

/// Errors that can occur while executing a contract read.
///
/// `CallFailed` is scoped to exactly one function call; `Transport` affects
/// every call sharing the failed dispatch (a whole multicall, or the single
/// request of an immediate read).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReadError {
    /// A single function call failed at the chain-client level.
    #[error("call to {function} on {address} failed")]
    CallFailed {
        /// Target contract address.
        address: Address,
        /// Name of the function that failed.
        function: String,
        /// The underlying client error.
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// The read transport itself failed (multicall or single-call RPC).
    #[error("transport failure during {operation}")]
    Transport {
        /// Description of the operation that failed (e.g. "multicall aggregate3").
        operation: String,
        /// The underlying transport error.
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// The supplied ABI fragment could not be parsed.
    #[error("invalid ABI fragment for {function}")]
    Abi {
        /// Name or signature of the offending function.
        function: String,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// Arguments could not be ABI-encoded against the function's inputs.
    #[error("failed to encode arguments for {function}")]
    Encode {
        /// Name of the function being encoded.
        function: String,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// Return data could not be decoded against the function's outputs.
    #[error("failed to decode return data for {function}")]
    Decode {
        /// Name of the function being decoded.
        function: String,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

fn boxed_message(message: impl Into<String>) -> Arc<dyn std::error::Error + Send + Sync> {
    let boxed: Box<dyn std::error::Error + Send + Sync> = message.into().into();
    Arc::from(boxed)
}

impl ReadError {
    /// Helper to create a `CallFailed` error from any error type.
    pub fn call_failed(
        address: Address,
        function: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ReadError::CallFailed {
            address,
            function: function.into(),
            source: Arc::new(source),
        }
    }

    /// Helper to create a `CallFailed` error from a plain message.
    pub fn call_failed_msg(
        address: Address,
        function: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ReadError::CallFailed {
            address,
            function: function.into(),
            source: boxed_message(message),
        }
    }

    /// Helper to create a `Transport` error from any error type.
    pub fn transport(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ReadError::Transport {
            operation: operation.into(),
            source: Arc::new(source),
        }
    }

    /// Helper to create a `Transport` error from a plain message.
    pub fn transport_msg(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ReadError::Transport {
            operation: operation.into(),
            source: boxed_message(message),
        }
    }

    /// Helper to create an `Abi` error from any error type.
    pub fn abi(
        function: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ReadError::Abi {
            function: function.into(),
            source: Arc::new(source),
        }
    }

    /// Helper to create an `Encode` error from any error type.
    pub fn encode(
        function: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ReadError::Encode {
            function: function.into(),
            source: Arc::new(source),
        }
    }

    /// Helper to create a `Decode` error from any error type.
    pub fn decode(
        function: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ReadError::Decode {
            function: function.into(),
            source: Arc::new(source),
        }
    }

    /// Helper to create a `Decode` error from a plain message.
    pub fn decode_msg(function: impl Into<String>, message: impl Into<String>) -> Self {
        ReadError::Decode {
            function: function.into(),
            source: boxed_message(message),
        }
    }
}

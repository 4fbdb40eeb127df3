//! Typed read requests against a contract function.
//!
//! A [`CallDescriptor`] carries everything needed to encode one `eth_call`:
//! the target address, the ABI fragment for the function, and its arguments.
//! [`CallOptions`] carries the per-request knobs of the read manager
//! (priority lane, cache TTL, cache bypass, block tag).

use alloy_dyn_abi::DynSolValue;
use alloy_eips::BlockId;
use alloy_json_abi::Function;
use alloy_primitives::{hex, Address};
use std::time::Duration;

use crate::cache::CacheKey;
use crate::errors::ReadError;

/// A single contract read: target address, function ABI fragment, arguments.
///
/// The ABI fragment is supplied by the caller per request; the read manager
/// does not own contract ABIs.
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    /// Target contract address.
    pub address: Address,
    /// ABI fragment sufficient to encode the call and decode its output.
    pub function: Function,
    /// Ordered argument list, matching the function's inputs.
    pub args: Vec<DynSolValue>,
}

impl CallDescriptor {
    /// Creates a descriptor from an already-parsed ABI fragment.
    pub fn new(address: Address, function: Function, args: Vec<DynSolValue>) -> Self {
        Self {
            address,
            function,
            args,
        }
    }

    /// Creates a descriptor from a human-readable function signature.
    ///
    /// # Example
    ///
    /// ```rust
    /// use batchread::CallDescriptor;
    /// use alloy_primitives::Address;
    ///
    /// let call = CallDescriptor::parse(
    ///     Address::ZERO,
    ///     "balanceOf(address)(uint256)",
    ///     vec![Address::ZERO.into()],
    /// )
    /// .unwrap();
    /// assert_eq!(call.function_name(), "balanceOf");
    /// ```
    pub fn parse(
        address: Address,
        signature: &str,
        args: Vec<DynSolValue>,
    ) -> Result<Self, ReadError> {
        let function = Function::parse(signature).map_err(|e| ReadError::abi(signature, e))?;
        Ok(Self::new(address, function, args))
    }

    /// Name of the function being called.
    pub fn function_name(&self) -> &str {
        &self.function.name
    }

    /// Derives the deterministic cache key for this call at a block tag.
    ///
    /// The key renders as `address:function:args:block`, where `args` is the
    /// hex of the ABI-encoded calldata. Identical (address, function, args,
    /// block) tuples always produce the same key.
    pub fn cache_key(&self, block: Option<&BlockId>) -> CacheKey {
        use alloy_dyn_abi::JsonAbiExt;

        let args = match self.function.abi_encode_input(&self.args) {
            Ok(encoded) => hex::encode(encoded),
            // Unencodable args can never be fetched either; any deterministic
            // rendering keeps the key stable.
            Err(_) => format!("{:?}", self.args),
        };
        let block = block
            .map(|b| b.to_string())
            .unwrap_or_else(|| "latest".to_string());
        CacheKey::new(self.address, self.function.name.clone(), args, block)
    }
}

/// Per-request options for [`BatchReadManager::call`](crate::BatchReadManager::call).
///
/// Defaults: priority 0 (batched lane), manager default TTL, cache enabled,
/// latest block.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Request priority. Values above the manager's immediate threshold
    /// (default 5) skip batching entirely.
    pub priority: i32,
    /// Cache TTL for the fetched value. `None` uses the manager default.
    ///
    /// Honored on the immediate lane only; results fetched through a batch
    /// dispatch always cache at the manager default.
    pub ttl: Option<Duration>,
    /// Skip the cache entirely: no lookup before the fetch, no store after.
    pub bypass_cache: bool,
    /// Optional block tag scoping the read to a point in history.
    pub block: Option<BlockId>,
}

impl CallOptions {
    /// Creates options with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the cache TTL for the fetched value.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Disables the cache for this request.
    pub fn bypassing_cache(mut self) -> Self {
        self.bypass_cache = true;
        self
    }

    /// Scopes the read to a specific block.
    pub fn at_block(mut self, block: BlockId) -> Self {
        self.block = Some(block);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, U256};

    fn descriptor(args: Vec<DynSolValue>) -> CallDescriptor {
        CallDescriptor::parse(
            address!("0000000000000000000000000000000000000001"),
            "balanceOf(address)(uint256)",
            args,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_rejects_malformed_signature() {
        let result = CallDescriptor::parse(Address::ZERO, "not a signature", vec![]);
        assert!(matches!(result, Err(ReadError::Abi { .. })));
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let holder = DynSolValue::Address(address!("00000000000000000000000000000000000000aa"));
        let a = descriptor(vec![holder.clone()]).cache_key(None);
        let b = descriptor(vec![holder]).cache_key(None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cache_key_varies_by_args_and_block() {
        let alice = DynSolValue::Address(address!("00000000000000000000000000000000000000aa"));
        let bob = DynSolValue::Address(address!("00000000000000000000000000000000000000bb"));

        let base = descriptor(vec![alice.clone()]).cache_key(None);
        assert_ne!(base, descriptor(vec![bob]).cache_key(None));

        let pinned = BlockId::number(1_000_000);
        assert_ne!(base, descriptor(vec![alice]).cache_key(Some(&pinned)));
    }

    #[test]
    fn test_cache_key_defaults_to_latest() {
        let key = descriptor(vec![DynSolValue::Uint(U256::ZERO, 256)]).cache_key(None);
        assert!(key.to_string().ends_with(":latest"));
    }

    #[test]
    fn test_options_builders() {
        let options = CallOptions::new()
            .with_priority(7)
            .with_ttl(Duration::from_secs(5))
            .bypassing_cache();
        assert_eq!(options.priority, 7);
        assert_eq!(options.ttl, Some(Duration::from_secs(5)));
        assert!(options.bypass_cache);
        assert!(options.block.is_none());
    }
}

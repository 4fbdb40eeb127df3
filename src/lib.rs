//! Batched and cached EVM contract reads.
//!
//! `batchread` coalesces concurrent contract-read requests into Multicall3
//! batches, applies a priority bypass lane for latency-sensitive reads, and
//! serves repeats from a time- and block-aware in-memory cache. See
//! [`BatchReadManager`] for the main entry point.

mod aggregator;
mod cache;
mod call;
mod client;
mod config;
pub mod errors;
mod manager;
mod queue;
mod stats;

pub use aggregator::YieldAggregator;
pub use cache::{CacheKey, ReadCache};
pub use call::{CallDescriptor, CallOptions};
pub use client::{AlloyReadClient, CallOutcome, ChainReadClient, MULTICALL3_ADDRESS};
pub use config::ManagerConfig;
pub use errors::{BatchReadError, ReadError};
pub use manager::{BatchReadManager, BatchReadManagerBuilder, PreloadRequest};
pub use stats::ReadStats;

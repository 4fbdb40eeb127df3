// SPDX-FileCopyrightText: 2025 Batchread Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The batched read manager.
//!
//! Accepts typed read requests, serves them from a TTL- and block-aware cache
//! when possible, and otherwise routes them down one of two lanes:
//!
//! - **Immediate lane** (priority above the configured threshold): a direct
//!   single read, bypassing the batch queue entirely.
//! - **Batched lane** (everything else): the request joins a priority-ordered
//!   queue and suspends until a debounced dispatch cycle drains it, groups it
//!   with its co-batched requests by contract address, and settles its slot
//!   from one multicall per address.
//!
//! Failures are never retried here; a failed batch or call leaves the manager
//! fully usable. The debounce timer and the optional cache sweep are real
//! tasks whose handles the manager owns and aborts on drop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::Address;
use futures::future::join_all;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{CacheKey, ReadCache};
use crate::call::{CallDescriptor, CallOptions};
use crate::client::{CallOutcome, ChainReadClient};
use crate::config::ManagerConfig;
use crate::errors::{BatchReadError, ReadError};
use crate::queue::{BatchQueue, PendingRead};
use crate::stats::ReadStats;

/// A read to warm the cache with, ahead of real traffic.
#[derive(Debug, Clone)]
pub struct PreloadRequest {
    /// The call to issue.
    pub call: CallDescriptor,
    /// Optional explicit options; defaults to the preload priority on the
    /// batched lane.
    pub options: Option<CallOptions>,
}

impl PreloadRequest {
    /// Creates a preload request with default options.
    pub fn new(call: CallDescriptor) -> Self {
        Self {
            call,
            options: None,
        }
    }
}

/// Shared state behind the manager's lock.
///
/// Cache, queue, and stats are only ever mutated while holding this lock;
/// network awaits happen outside it.
struct Inner<C> {
    client: Option<Arc<C>>,
    cache: ReadCache,
    queue: BatchQueue,
    stats: ReadStats,
    /// True while a dispatch task is sleeping or draining; enqueues during
    /// that window do not schedule another one.
    dispatch_scheduled: bool,
    dispatch_task: Option<JoinHandle<()>>,
}

enum Lane<C> {
    Immediate(Arc<C>, CallDescriptor),
    Batched(oneshot::Receiver<Result<Vec<DynSolValue>, ReadError>>),
}

/// Batched, cached contract read manager.
///
/// # Example
///
/// ```rust,ignore
/// use batchread::{AlloyReadClient, BatchReadManager, CallDescriptor, CallOptions};
///
/// let manager = BatchReadManager::new(AlloyReadClient::new(provider));
/// let call = CallDescriptor::parse(token, "totalSupply()(uint256)", vec![])?;
/// let supply = manager.call(call, CallOptions::default()).await?;
/// ```
pub struct BatchReadManager<C: ChainReadClient> {
    inner: Arc<Mutex<Inner<C>>>,
    config: ManagerConfig,
    cleanup_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

/// Builder for a [`BatchReadManager`], for deployments where the chain client
/// becomes available only after construction.
pub struct BatchReadManagerBuilder<C> {
    client: Option<Arc<C>>,
    config: ManagerConfig,
}

impl<C: ChainReadClient> Default for BatchReadManagerBuilder<C> {
    fn default() -> Self {
        Self {
            client: None,
            config: ManagerConfig::default(),
        }
    }
}

impl<C: ChainReadClient> BatchReadManagerBuilder<C> {
    /// Sets the chain client.
    pub fn client(mut self, client: C) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    /// Sets the manager configuration.
    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the manager. Calls made before a client is attached fail with
    /// [`BatchReadError::NotInitialized`].
    pub fn build(self) -> BatchReadManager<C> {
        BatchReadManager {
            inner: Arc::new(Mutex::new(Inner {
                client: self.client,
                cache: ReadCache::new(),
                queue: BatchQueue::new(),
                stats: ReadStats::default(),
                dispatch_scheduled: false,
                dispatch_task: None,
            })),
            config: self.config,
            cleanup_task: std::sync::Mutex::new(None),
        }
    }
}

impl<C: ChainReadClient> BatchReadManager<C> {
    /// Creates a manager over `client` with default configuration.
    pub fn new(client: C) -> Self {
        Self::builder().client(client).build()
    }

    /// Creates a manager over `client` with explicit configuration.
    pub fn with_config(client: C, config: ManagerConfig) -> Self {
        Self::builder().client(client).config(config).build()
    }

    /// Returns a builder.
    pub fn builder() -> BatchReadManagerBuilder<C> {
        BatchReadManagerBuilder::default()
    }

    /// Attaches (or replaces) the chain client.
    pub async fn set_client(&self, client: C) {
        let mut inner = self.inner.lock().await;
        inner.client = Some(Arc::new(client));
    }

    /// Executes a contract read.
    ///
    /// Cache lookup first (unless `bypass_cache`): a valid entry is returned
    /// without any network access. On a miss, priorities above the immediate
    /// threshold fetch directly; everything else joins the batch queue and
    /// suspends until its slot in a future dispatch settles.
    pub async fn call(
        &self,
        call: CallDescriptor,
        options: CallOptions,
    ) -> Result<Vec<DynSolValue>, BatchReadError> {
        let key = call.cache_key(options.block.as_ref());

        let lane = {
            let mut inner = self.inner.lock().await;
            let client = inner.client.clone().ok_or(BatchReadError::NotInitialized)?;

            if !options.bypass_cache {
                if let Some(value) = inner.cache.get(&key) {
                    inner.stats.cache_hits += 1;
                    debug!(key = %key, "cache hit");
                    return Ok(value);
                }
            }

            if options.priority > self.config.immediate_priority_threshold {
                inner.stats.cache_misses += 1;
                Lane::Immediate(client, call)
            } else {
                // A shed request is a rejection, not a miss: it never reaches
                // the fetch path, so it must not skew the hit rate.
                if inner.queue.len() >= self.config.max_queue_len {
                    inner.stats.failed_requests += 1;
                    return Err(BatchReadError::QueueFull {
                        pending: inner.queue.len(),
                    });
                }
                inner.stats.cache_misses += 1;
                let (tx, rx) = oneshot::channel();
                inner.queue.push(PendingRead {
                    call,
                    priority: options.priority,
                    enqueued_at: Instant::now(),
                    block: options.block.clone(),
                    bypass_cache: options.bypass_cache,
                    tx,
                });
                if !inner.dispatch_scheduled {
                    inner.dispatch_scheduled = true;
                    let handle = tokio::spawn(run_dispatch(
                        Arc::clone(&self.inner),
                        self.config.clone(),
                    ));
                    inner.dispatch_task = Some(handle);
                }
                Lane::Batched(rx)
            }
        };

        match lane {
            Lane::Immediate(client, call) => {
                let started = Instant::now();
                match client.read_one(&call, options.block.clone()).await {
                    Ok(value) => {
                        let mut inner = self.inner.lock().await;
                        if !options.bypass_cache {
                            let ttl = options.ttl.unwrap_or(self.config.default_ttl);
                            inner.cache.insert(key, value.clone(), ttl);
                        }
                        inner.stats.total_requests += 1;
                        debug!(elapsed = ?started.elapsed(), "immediate read completed");
                        Ok(value)
                    }
                    Err(err) => {
                        let mut inner = self.inner.lock().await;
                        inner.stats.failed_requests += 1;
                        warn!(error = %err, "immediate read failed");
                        Err(err.into())
                    }
                }
            }
            Lane::Batched(rx) => {
                let result = rx
                    .await
                    .map_err(|e| ReadError::transport("batch dispatch", e))?;
                Ok(result?)
            }
        }
    }

    /// Warms the cache with best-effort reads.
    ///
    /// Each request goes through [`call`](Self::call) at the preload priority
    /// (below default, so warm-ups never preempt real requests) unless its
    /// options say otherwise. Individual failures are swallowed and logged;
    /// the caller never sees them.
    pub async fn preload(&self, requests: Vec<PreloadRequest>) {
        let preload_priority = self.config.preload_priority;
        let reads = requests.into_iter().map(|request| {
            let options = request
                .options
                .unwrap_or_else(|| CallOptions::default().with_priority(preload_priority));
            async move {
                if let Err(err) = self.call(request.call, options).await {
                    debug!(error = %err, "preload read failed");
                }
            }
        });
        join_all(reads).await;
    }

    /// Invalidates cache entries.
    ///
    /// With no pattern, clears the entire cache. With a pattern, removes
    /// every key containing it as a substring. Returns the number of entries
    /// removed; absent keys are a no-op.
    pub async fn invalidate_cache(&self, pattern: Option<&str>) -> usize {
        let mut inner = self.inner.lock().await;
        match pattern {
            None => inner.cache.invalidate_all(),
            Some(pattern) => inner.cache.invalidate_matching(pattern),
        }
    }

    /// Invalidates every cache entry whose key matches `predicate`.
    pub async fn invalidate_cache_where(
        &self,
        predicate: impl Fn(&CacheKey) -> bool,
    ) -> usize {
        let mut inner = self.inner.lock().await;
        inner.cache.invalidate_where(predicate)
    }

    /// Removes every presently-invalid cache entry. Returns the number
    /// removed.
    pub async fn cleanup_cache(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.cache.sweep_expired()
    }

    /// Runs [`cleanup_cache`](Self::cleanup_cache) on a fixed interval,
    /// independent of request traffic, until the manager is dropped.
    ///
    /// Calling this again replaces (and stops) the previous sweep task.
    pub fn spawn_cleanup_task(&self, interval: Duration) {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip it so the first
            // sweep happens one full interval in.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let mut inner = inner.lock().await;
                inner.cache.sweep_expired();
            }
        });
        if let Ok(mut task) = self.cleanup_task.lock() {
            if let Some(previous) = task.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Records a newly observed chain height, invalidating cache entries
    /// captured at an older height.
    pub async fn record_block_height(&self, height: u64) {
        let mut inner = self.inner.lock().await;
        inner.cache.record_height(height);
    }

    /// Value-copy snapshot of the accumulated statistics.
    pub async fn stats(&self) -> ReadStats {
        let inner = self.inner.lock().await;
        inner.stats.clone()
    }

    /// Current number of cache entries.
    pub async fn cache_size(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.cache.len()
    }
}

impl<C: ChainReadClient> Drop for BatchReadManager<C> {
    fn drop(&mut self) {
        if let Ok(mut task) = self.cleanup_task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
        // An aborted dispatch drops its oneshot senders; any caller still
        // waiting observes a transport error instead of hanging.
        if let Ok(mut inner) = self.inner.try_lock() {
            if let Some(handle) = inner.dispatch_task.take() {
                handle.abort();
            }
        }
    }
}

/// One scheduled dispatch: sleeps out the debounce window, then drains and
/// settles batches until the queue is empty.
async fn run_dispatch<C: ChainReadClient>(inner: Arc<Mutex<Inner<C>>>, config: ManagerConfig) {
    loop {
        tokio::time::sleep(config.debounce).await;

        let (client, drained) = {
            let mut guard = inner.lock().await;
            let drained = guard.queue.drain(config.max_batch_size);
            (guard.client.clone(), drained)
        };

        if !drained.is_empty() {
            match client {
                Some(client) => dispatch_batch(&inner, &config, client, drained).await,
                None => {
                    // Client detached between enqueue and dispatch; the whole
                    // cycle fails as a unit.
                    let failed = drained.len() as u64;
                    warn!(failed, "dispatch cycle failed: no chain client attached");
                    for request in drained {
                        let _ = request.tx.send(Err(ReadError::transport_msg(
                            "batch dispatch",
                            "no chain client attached",
                        )));
                    }
                    let mut guard = inner.lock().await;
                    guard.stats.failed_requests += failed;
                }
            }
        }

        let mut guard = inner.lock().await;
        if guard.queue.is_empty() {
            guard.dispatch_scheduled = false;
            return;
        }
        // Leftovers beyond the batch size stay queued; run another cycle.
    }
}

/// Groups drained requests by contract address, issues one multicall per
/// group, settles every slot, and folds the cycle into the stats in one
/// update.
async fn dispatch_batch<C: ChainReadClient>(
    inner: &Arc<Mutex<Inner<C>>>,
    config: &ManagerConfig,
    client: Arc<C>,
    drained: Vec<PendingRead>,
) {
    let drained_count = drained.len() as u64;
    let started = Instant::now();

    // Partition by target address, preserving per-address submission order.
    let mut groups: Vec<(Address, Vec<PendingRead>)> = Vec::new();
    for request in drained {
        match groups
            .iter_mut()
            .find(|(address, _)| *address == request.call.address)
        {
            Some((_, group)) => group.push(request),
            None => groups.push((request.call.address, vec![request])),
        }
    }
    let oldest_wait = groups
        .iter()
        .flat_map(|(_, group)| group.iter())
        .map(|request| request.enqueued_at.elapsed())
        .max()
        .unwrap_or_default();
    debug!(
        requests = drained_count,
        groups = groups.len(),
        ?oldest_wait,
        "dispatching batch"
    );

    let group_reads = groups.into_iter().map(|(address, requests)| {
        let client = Arc::clone(&client);
        async move {
            let calls: Vec<CallDescriptor> =
                requests.iter().map(|request| request.call.clone()).collect();
            let outcome = client.read_many(&calls).await;
            (address, requests, outcome)
        }
    });
    let settled = join_all(group_reads).await;
    let latency = started.elapsed();

    let mut to_cache: Vec<(CacheKey, Vec<DynSolValue>)> = Vec::new();
    let mut successes = 0u64;
    let mut failures = 0u64;

    for (address, requests, outcome) in settled {
        match outcome {
            // Transport failure is isolated to this address group; other
            // groups in the same batch settle normally.
            Err(err) => {
                warn!(%address, error = %err, "multicall group failed");
                failures += requests.len() as u64;
                for request in requests {
                    let _ = request.tx.send(Err(err.clone()));
                }
            }
            Ok(outcomes) => {
                let mut outcomes = outcomes.into_iter();
                for request in requests {
                    match outcomes.next() {
                        Some(CallOutcome::Success(value)) => {
                            successes += 1;
                            if !request.bypass_cache {
                                let key = request.call.cache_key(request.block.as_ref());
                                to_cache.push((key, value.clone()));
                            }
                            let _ = request.tx.send(Ok(value));
                        }
                        Some(CallOutcome::Failure(err)) => {
                            warn!(
                                %address,
                                function = request.call.function_name(),
                                error = %err,
                                "batched read failed"
                            );
                            failures += 1;
                            let _ = request.tx.send(Err(err));
                        }
                        None => {
                            failures += 1;
                            let _ = request.tx.send(Err(ReadError::transport_msg(
                                "batch dispatch",
                                "multicall returned fewer results than calls",
                            )));
                        }
                    }
                }
            }
        }
    }

    let mut guard = inner.lock().await;
    for (key, value) in to_cache {
        guard.cache.insert(key, value, config.default_ttl);
    }
    guard.stats.batched_requests += drained_count;
    guard.stats.total_requests += successes;
    guard.stats.failed_requests += failures;
    guard.stats.record_dispatch(latency);
    debug!(
        requests = drained_count,
        successes,
        failures,
        ?latency,
        "dispatch cycle settled"
    );
}

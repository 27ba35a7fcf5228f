//! Bounded Tokio worker pool for delivery units.
//!
//! All requests share one pool. A semaphore bounds how many units run at
//! once; a pending counter bounds how many units may be admitted but not yet
//! finished, across every in-flight batch.
//!
//! # Invariants
//!
//! - Admission is all-or-nothing. A batch whose size exceeds the remaining
//!   pending capacity is rejected before any of its units is spawned.
//! - `execute_all` returns only after every unit of the batch has finished,
//!   with outcomes in submission order.
//! - A unit that panics yields a `Failed` outcome in its own slot; its
//!   siblings' outcomes are kept.
//! - Pending capacity taken by a batch is released when the batch completes,
//!   including when a unit panics.
//! - `TaskFailed` is reserved for units cancelled before producing an outcome.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use sealpost_core::{DeliveryError, DeliveryOutcome, DeliveryTask, PoolError, WorkerPool};
use serde::{Deserialize, Serialize};
use tokio::{sync::Semaphore, task::JoinSet};

/// Worker pool limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Units allowed to run concurrently
    pub max_concurrency: usize,
    /// Units allowed to be admitted but unfinished, across all batches
    pub max_pending: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_concurrency: 16, max_pending: 10_000 }
    }
}

/// [`WorkerPool`] running units as Tokio tasks.
#[derive(Debug)]
pub struct TokioWorkerPool {
    permits: Arc<Semaphore>,
    pending: AtomicUsize,
    max_pending: usize,
    closed: AtomicBool,
}

impl TokioWorkerPool {
    /// Create a pool with the given limits.
    ///
    /// A zero concurrency limit is raised to one so admitted batches always
    /// make progress.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            pending: AtomicUsize::new(0),
            max_pending: config.max_pending,
            closed: AtomicBool::new(false),
        }
    }

    /// Units currently admitted and unfinished.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Stop admitting batches. Batches already admitted run to completion.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        tracing::info!(pending = self.pending(), "worker pool shut down");
    }

    /// Returns true once [`shutdown`](Self::shutdown) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn admit(&self, requested: usize) -> Result<PendingGuard<'_>, PoolError> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }

        let mut current = self.pending.load(Ordering::SeqCst);
        loop {
            let available = self.max_pending.saturating_sub(current);
            if requested > available {
                return Err(PoolError::Saturated { requested, available });
            }

            match self.pending.compare_exchange_weak(
                current,
                current + requested,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Ok(PendingGuard { pending: &self.pending, units: requested }),
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for TokioWorkerPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

/// Releases a batch's pending capacity when dropped.
struct PendingGuard<'a> {
    pending: &'a AtomicUsize,
    units: usize,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.fetch_sub(self.units, Ordering::SeqCst);
    }
}

#[async_trait]
impl WorkerPool for TokioWorkerPool {
    async fn execute_all(&self, tasks: Vec<DeliveryTask>) -> Result<Vec<DeliveryOutcome>, PoolError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let units = tasks.len();
        let _admitted = self.admit(units).inspect_err(|err| tracing::warn!(%err, "batch rejected"))?;

        let mut set = JoinSet::new();
        for (index, task) in tasks.into_iter().enumerate() {
            let permits = Arc::clone(&self.permits);
            set.spawn(async move {
                let _permit = permits.acquire_owned().await.map_err(|err| err.to_string())?;
                let (destination, device_id) = (task.destination, task.device_id);

                // A panicking sender fails only its own unit.
                let outcome = match tokio::spawn(task.run()).await {
                    Ok(outcome) => outcome,
                    Err(err) if err.is_panic() => {
                        tracing::error!(%destination, device_id, %err, "delivery unit panicked");
                        DeliveryOutcome {
                            destination,
                            device_id,
                            result: Err(DeliveryError::Failed(format!("delivery unit panicked: {err}"))),
                        }
                    },
                    Err(err) => return Err(err.to_string()),
                };
                Ok::<_, String>((index, outcome))
            });
        }

        let mut slots: Vec<Option<DeliveryOutcome>> = (0..units).map(|_| None).collect();
        let mut failure = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok((index, outcome))) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(outcome);
                    }
                },
                Ok(Err(reason)) => {
                    failure.get_or_insert(reason);
                },
                Err(err) => {
                    tracing::error!(%err, "delivery unit aborted");
                    failure.get_or_insert_with(|| err.to_string());
                },
            }
        }

        if let Some(reason) = failure {
            return Err(PoolError::TaskFailed(reason));
        }

        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| PoolError::TaskFailed("unit finished without an outcome".to_owned()))
    }
}

//! Fault injection for the worker pool.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use sealpost_core::{DeliveryOutcome, DeliveryTask, PoolError, WorkerPool};

use crate::SimEnv;

/// Pool wrapper that rejects a seeded fraction of batches.
///
/// A rejected batch never reaches the inner pool, so none of its units run.
pub struct ChaoticPool {
    inner: Arc<dyn WorkerPool>,
    env: SimEnv,
    failure_percent: u64,
    rejected: AtomicUsize,
}

impl ChaoticPool {
    /// Wrap `inner`, rejecting roughly `failure_percent` of batches.
    pub fn new(inner: Arc<dyn WorkerPool>, env: SimEnv, failure_percent: u8) -> Self {
        Self { inner, env, failure_percent: u64::from(failure_percent.min(100)), rejected: AtomicUsize::new(0) }
    }

    /// Batches rejected so far.
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkerPool for ChaoticPool {
    async fn execute_all(&self, tasks: Vec<DeliveryTask>) -> Result<Vec<DeliveryOutcome>, PoolError> {
        if self.env.random_below(100) < self.failure_percent {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(PoolError::Saturated { requested: tasks.len(), available: 0 });
        }

        self.inner.execute_all(tasks).await
    }
}

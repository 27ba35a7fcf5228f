//! Per-device delivery units and the pool that runs them.
//!
//! The engine turns a validated request into one [`DeliveryTask`] per
//! (identifier, device) pair and hands the whole batch to a [`WorkerPool`].
//! A unit's own failure is part of its [`DeliveryOutcome`]; only the pool
//! failing to run the batch is an error of the request.

use std::sync::Arc;

use async_trait::async_trait;
use sealpost_proto::{DeviceId, Envelope, ServiceIdentifier};
use thiserror::Error;

use crate::account::Account;

/// Failure of a single delivery unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The device is no longer reachable by push or connection.
    #[error("device not registered")]
    NotRegistered,

    /// Delivery failed for another reason.
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Transport that hands an envelope to one device.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Deliver `envelope` to `device_id` of `account`.
    ///
    /// With `online` set, only currently connected devices receive the
    /// message; nothing is queued.
    async fn send(
        &self,
        account: &Account,
        device_id: DeviceId,
        envelope: Envelope,
        online: bool,
    ) -> Result<(), DeliveryError>;
}

/// One independent unit of delivery work.
pub struct DeliveryTask {
    /// Transport to deliver through
    pub sender: Arc<dyn MessageSender>,
    /// Destination account
    pub account: Arc<Account>,
    /// Identifier the client addressed
    pub destination: ServiceIdentifier,
    /// Destination device
    pub device_id: DeviceId,
    /// Envelope for the device
    pub envelope: Envelope,
    /// Deliver only if the device is connected
    pub online: bool,
}

impl DeliveryTask {
    /// Run the unit. Never fails; the result is carried in the outcome.
    pub async fn run(self) -> DeliveryOutcome {
        let result =
            self.sender.send(&self.account, self.device_id, self.envelope, self.online).await;
        DeliveryOutcome { destination: self.destination, device_id: self.device_id, result }
    }
}

impl std::fmt::Debug for DeliveryTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryTask")
            .field("destination", &self.destination)
            .field("device_id", &self.device_id)
            .field("envelope", &self.envelope)
            .field("online", &self.online)
            .finish_non_exhaustive()
    }
}

/// Result of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Identifier the client addressed
    pub destination: ServiceIdentifier,
    /// Destination device
    pub device_id: DeviceId,
    /// What happened
    pub result: Result<(), DeliveryError>,
}

/// Batch-level failure of the worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Admitting the batch would exceed the pool's pending capacity.
    #[error("worker pool saturated: {requested} units requested, {available} available")]
    Saturated {
        /// Units in the rejected batch
        requested: usize,
        /// Pending capacity left at admission time
        available: usize,
    },

    /// The pool has been shut down.
    #[error("worker pool closed")]
    Closed,

    /// A unit was cancelled instead of returning an outcome.
    #[error("delivery unit aborted: {0}")]
    TaskFailed(String),
}

/// Bounded executor shared by all requests.
///
/// # Invariants
///
/// - All-or-nothing admission: a batch is admitted whole or rejected whole,
///   before any unit runs.
/// - No early return: `execute_all` resolves only after every admitted unit
///   has finished, and returns one outcome per unit.
#[async_trait]
pub trait WorkerPool: Send + Sync {
    /// Run every task and collect their outcomes.
    async fn execute_all(&self, tasks: Vec<DeliveryTask>) -> Result<Vec<DeliveryOutcome>, PoolError>;
}

//! Recording message sender.
//!
//! Stands in for the push/websocket transport. Every successful delivery is
//! recorded; individual devices can be made unreachable or failing to
//! exercise partial-delivery paths.

use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use sealpost_core::{Account, DeliveryError, MessageSender};
use sealpost_proto::{DeviceId, Envelope};
use uuid::Uuid;

/// One recorded delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Receiving account
    pub account: Uuid,
    /// Receiving device
    pub device_id: DeviceId,
    /// Delivered envelope
    pub envelope: Envelope,
    /// Online-only flag the send carried
    pub online: bool,
}

#[derive(Debug, Default)]
struct SenderState {
    sent: Vec<SentMessage>,
    unreachable: HashSet<(Uuid, DeviceId)>,
    failing: HashSet<(Uuid, DeviceId)>,
}

/// Message sender that records deliveries in memory.
#[derive(Debug, Default)]
pub struct MemoryMessageSender {
    state: Mutex<SenderState>,
}

impl MemoryMessageSender {
    /// Create a sender that delivers everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a device report [`DeliveryError::NotRegistered`].
    pub fn mark_unreachable(&self, account: Uuid, device_id: DeviceId) {
        self.lock().unreachable.insert((account, device_id));
    }

    /// Make a device report [`DeliveryError::Failed`].
    pub fn mark_failing(&self, account: Uuid, device_id: DeviceId) {
        self.lock().failing.insert((account, device_id));
    }

    /// Every delivery so far, in completion order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.lock().sent.clone()
    }

    /// Number of deliveries so far.
    pub fn sent_count(&self) -> usize {
        self.lock().sent.len()
    }

    fn lock(&self) -> MutexGuard<'_, SenderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MessageSender for MemoryMessageSender {
    async fn send(
        &self,
        account: &Account,
        device_id: DeviceId,
        envelope: Envelope,
        online: bool,
    ) -> Result<(), DeliveryError> {
        let mut state = self.lock();
        let key = (account.aci, device_id);

        if state.unreachable.contains(&key) {
            return Err(DeliveryError::NotRegistered);
        }
        if state.failing.contains(&key) {
            return Err(DeliveryError::Failed(format!("device {device_id} rejected delivery")));
        }

        state.sent.push(SentMessage { account: account.aci, device_id, envelope, online });
        Ok(())
    }
}

//! Real system wrapper that mirrors [`ModelWorld`](crate::ModelWorld)'s
//! interface.
//!
//! Builds real accounts, wire payloads and message lists from model
//! operations and drives the dispatch engine on a single-threaded Tokio
//! runtime.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use sealpost_core::{
    ACCESS_KEY_LEN, AccessKey, Account, AuthenticatedSender, Device, DispatchConfig, DispatchEngine,
    DispatchError, Environment, MultiRecipientRequest, SingleRecipientRequest, WorkerPool,
};
use sealpost_proto::{
    EnvelopeType, IdentifierEncoding, IncomingMessage, IncomingMessageList, KEY_MATERIAL_LEN,
    MultiRecipientMessage, Recipient, ServiceIdentifier,
};
use sealpost_server::{MemoryAccountDirectory, MemoryMessageSender, PoolConfig, TokioWorkerPool};

use crate::{
    ChaoticPool, SimEnv,
    model::{
        AccountIndex, AccountSpec, KeyChoice, ModelDevice, ModelIdentifier, ModelRecipient,
        Operation, OperationResult, aci, pni, reduce_device, registration_id,
    },
};

const SHARED_PAYLOAD_LEN: usize = 40;

/// The real engine plus the state needed to translate model operations.
pub struct RealWorld {
    runtime: tokio::runtime::Runtime,
    engine: DispatchEngine<SimEnv>,
    directory: Arc<MemoryAccountDirectory>,
    sender: Arc<MemoryMessageSender>,
    chaos: Option<Arc<ChaoticPool>>,
    accounts: Vec<Account>,
    env: SimEnv,
}

impl RealWorld {
    /// Create a world with one account per spec.
    pub fn new(specs: &[AccountSpec], seed: u64) -> std::io::Result<Self> {
        Self::build(specs, seed, None)
    }

    /// Create a world whose pool rejects about `failure_percent` of batches.
    pub fn with_pool_faults(specs: &[AccountSpec], seed: u64, failure_percent: u8) -> std::io::Result<Self> {
        Self::build(specs, seed, Some(failure_percent))
    }

    fn build(specs: &[AccountSpec], seed: u64, failure_percent: Option<u8>) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build()?;
        let env = SimEnv::with_seed(seed);

        let accounts: Vec<Account> =
            specs.iter().zip(0..).map(|(spec, index)| account(&env, index, *spec)).collect();

        let directory = Arc::new(MemoryAccountDirectory::with_accounts(accounts.iter().cloned()));
        let sender = Arc::new(MemoryMessageSender::new());
        let tokio_pool: Arc<dyn WorkerPool> =
            Arc::new(TokioWorkerPool::new(PoolConfig { max_concurrency: 4, max_pending: 1024 }));

        let chaos = failure_percent.map(|percent| Arc::new(ChaoticPool::new(tokio_pool.clone(), env.clone(), percent)));
        let pool: Arc<dyn WorkerPool> = match &chaos {
            Some(chaos) => chaos.clone() as Arc<dyn WorkerPool>,
            None => tokio_pool,
        };

        let engine = DispatchEngine::new(
            env.clone(),
            directory.clone(),
            sender.clone(),
            pool,
            DispatchConfig::default(),
        );

        Ok(Self { runtime, engine, directory, sender, chaos, accounts, env })
    }

    /// Environment shared with the engine.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Units delivered so far.
    pub fn deliveries(&self) -> usize {
        self.sender.sent_count()
    }

    /// Batches rejected by fault injection so far.
    pub fn rejected_batches(&self) -> usize {
        self.chaos.as_ref().map_or(0, |chaos| chaos.rejected())
    }

    /// Apply an operation to the real engine.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::SendMulti { recipients, key, story } => self.send_multi(recipients, *key, *story),
            Operation::SendSingle { destination, sender, key, devices, story } => {
                self.send_single(*destination, *sender, *key, devices, *story)
            },
            Operation::DisableDevice { account, device } => {
                let device_id = reduce_device(*device);
                if let Some(account) = self.accounts.get_mut(usize::from(*account)) {
                    for device in account.devices.iter_mut().filter(|d| d.id == device_id) {
                        device.has_signed_pre_key = false;
                    }
                    self.directory.insert(account.clone());
                }
                OperationResult::Updated
            },
            Operation::UnregisterDevice { account, device } => {
                self.sender.mark_unreachable(aci(*account), reduce_device(*device));
                OperationResult::Updated
            },
        }
    }

    fn send_multi(&self, recipients: &[ModelRecipient], key: KeyChoice, story: bool) -> OperationResult {
        let records: Vec<Recipient> = recipients
            .iter()
            .map(|r| Recipient {
                identifier: r.identifier.service_identifier(),
                device_id: r.device.device_id(),
                registration_id: r.device.claimed_registration_id(r.identifier.account),
                key_material: [r.identifier.account; KEY_MATERIAL_LEN],
            })
            .collect();

        let message = MultiRecipientMessage {
            encoding: IdentifierEncoding::Explicit,
            recipients: records,
            shared_payload: Bytes::from(vec![0x42; SHARED_PAYLOAD_LEN]),
        };
        let body = match message.to_bytes() {
            Ok(body) => body,
            Err(err) => return OperationResult::Rejected(DispatchError::Malformed(err).status()),
        };

        let expected = self.combined_key(recipients.iter().map(|r| r.identifier));
        let request = MultiRecipientRequest {
            body,
            combined_access_key: present(key, expected),
            timestamp: self.env.now_millis(),
            online: false,
            urgent: true,
            story,
        };

        let before = self.deliveries();
        match self.runtime.block_on(self.engine.send_multi_recipient(request)) {
            Ok(response) => OperationResult::Multi {
                uuids404: response.uuids404,
                deliveries: self.deliveries() - before,
            },
            Err(err) => OperationResult::Rejected(err.status()),
        }
    }

    fn send_single(
        &self,
        destination: ModelIdentifier,
        sender: Option<(AccountIndex, u8)>,
        key: KeyChoice,
        devices: &[ModelDevice],
        story: bool,
    ) -> OperationResult {
        let sender = sender.and_then(|(account, device)| {
            self.directory.get(&ServiceIdentifier::Aci(aci(account))).map(|account| AuthenticatedSender {
                account,
                device_id: reduce_device(device),
            })
        });

        let messages = devices
            .iter()
            .map(|device| IncomingMessage {
                envelope_type: EnvelopeType::Ciphertext,
                destination_device_id: device.device_id(),
                destination_registration_id: device.claimed_registration_id(destination.account),
                content: STANDARD.encode([destination.account; 8]),
            })
            .collect();

        let expected = self.combined_key([destination]);
        let request = SingleRecipientRequest {
            destination: destination.service_identifier(),
            sender,
            access_key: present(key, expected),
            story,
            body: IncomingMessageList { messages, online: false, urgent: true, timestamp: self.env.now_millis() },
        };

        let before = self.deliveries();
        match self.runtime.block_on(self.engine.send_message(request)) {
            Ok(response) => OperationResult::Single {
                needs_sync: response.needs_sync,
                deliveries: self.deliveries() - before,
            },
            Err(err) => OperationResult::Rejected(err.status()),
        }
    }

    /// XOR of the access keys of the distinct known accounts addressed.
    fn combined_key(&self, identifiers: impl IntoIterator<Item = ModelIdentifier>) -> AccessKey {
        let mut indices: Vec<AccountIndex> = identifiers.into_iter().map(|id| id.account).collect();
        indices.sort_unstable();
        indices.dedup();

        let keys: Vec<AccessKey> = indices
            .into_iter()
            .filter_map(|index| self.accounts.get(usize::from(index)))
            .filter_map(|account| account.access_key)
            .collect();

        AccessKey::combine(&keys)
    }
}

/// Key a request presents for `choice` when `expected` is correct.
fn present(choice: KeyChoice, expected: AccessKey) -> Option<AccessKey> {
    match choice {
        KeyChoice::Correct => Some(expected),
        KeyChoice::Wrong => Some(expected.xor(&AccessKey::from_bytes([0xff; ACCESS_KEY_LEN]))),
        KeyChoice::Missing => None,
    }
}

fn account(env: &SimEnv, index: AccountIndex, spec: AccountSpec) -> Account {
    let now = env.now_millis();
    let devices = spec
        .device_ids()
        .map(|id| Device {
            id,
            registration_id: registration_id(index, id),
            fetches_messages: true,
            apn_token: None,
            fcm_token: None,
            has_signed_pre_key: true,
            created_millis: now,
            last_seen_millis: now,
        })
        .collect();

    let access_key = spec.has_access_key.then(|| {
        let mut bytes = [0u8; ACCESS_KEY_LEN];
        env.random_bytes(&mut bytes);
        AccessKey::from_bytes(bytes)
    });

    Account { aci: aci(index), pni: pni(index), devices, access_key }
}

//! Fan-out dispatch engine.
//!
//! Drives one send request through
//! `Decode → Resolve → Reconcile → Gate → Execute → Aggregate`.
//!
//! ## Responsibilities
//!
//! - Validation: reject malformed, oversize and duplicate-addressed requests
//!   before the directory is touched
//! - Reconciliation: compare addressed devices with each account's enabled
//!   devices, reporting every affected identifier at once
//! - Gating: apply the access rules for single- and multi-recipient sends
//! - Fan-out: build one delivery unit per addressed device, submit them to
//!   the worker pool as one batch and fold the outcomes into the response
//!
//! # Invariants
//!
//! - Every state before Execute is free of side effects: a request that
//!   fails validation, reconciliation or gating submits nothing to the pool.
//! - Each distinct identifier is resolved at most once per request.
//! - A request submits at most one batch, and waits for all of it.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use bytes::Bytes;
use sealpost_proto::{
    AccountMismatchedDevices, AccountStaleDevices, Envelope, EnvelopeSource, EnvelopeType,
    IncomingMessageList, MismatchedDevices, MultiRecipientMessage, SendMessageResponse,
    SendMultiRecipientMessageResponse, ServiceIdentifier, StaleDevices,
};
use tracing::Span;

use crate::{
    access::{self, AuthenticatedSender, Credential},
    account::{AccessKey, Account},
    config::DispatchConfig,
    delivery::{DeliveryError, DeliveryOutcome, DeliveryTask, MessageSender, WorkerPool},
    directory::AccountDirectory,
    env::Environment,
    error::DispatchError,
    reconcile::{ClaimedDevices, Reconciliation, reconcile},
};

/// A multi-recipient send.
#[derive(Debug, Clone)]
pub struct MultiRecipientRequest {
    /// Binary multi-recipient payload
    pub body: Bytes,
    /// XOR of the recipients' access keys
    pub combined_access_key: Option<AccessKey>,
    /// Client timestamp (ms)
    pub timestamp: u64,
    /// Deliver only to connected devices
    pub online: bool,
    /// Whether pushes should wake devices
    pub urgent: bool,
    /// Story broadcast
    pub story: bool,
}

/// A single-recipient send.
#[derive(Debug, Clone)]
pub struct SingleRecipientRequest {
    /// Addressed account
    pub destination: ServiceIdentifier,
    /// Authenticated sender, if the transport authenticated one
    pub sender: Option<AuthenticatedSender>,
    /// Sealed-sender access key, if presented
    pub access_key: Option<AccessKey>,
    /// Story broadcast
    pub story: bool,
    /// Per-device messages
    pub body: IncomingMessageList,
}

/// Orchestrates send requests against the account directory, the delivery
/// transport and the worker pool.
pub struct DispatchEngine<E>
where
    E: Environment,
{
    env: E,
    directory: Arc<dyn AccountDirectory>,
    sender: Arc<dyn MessageSender>,
    pool: Arc<dyn WorkerPool>,
    config: DispatchConfig,
}

impl<E> DispatchEngine<E>
where
    E: Environment,
{
    /// Create an engine over the given collaborators.
    pub fn new(
        env: E,
        directory: Arc<dyn AccountDirectory>,
        sender: Arc<dyn MessageSender>,
        pool: Arc<dyn WorkerPool>,
        config: DispatchConfig,
    ) -> Self {
        Self { env, directory, sender, pool, config }
    }

    /// Active limits.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Deliver a multi-recipient payload.
    ///
    /// On success the response lists every identifier with at least one
    /// device that turned out to be unregistered during delivery.
    #[tracing::instrument(
        name = "multi_recipient",
        skip_all,
        fields(story = request.story, recipients = tracing::field::Empty)
    )]
    pub async fn send_multi_recipient(
        &self,
        request: MultiRecipientRequest,
    ) -> Result<SendMultiRecipientMessageResponse, DispatchError> {
        let message = MultiRecipientMessage::decode(request.body, &self.config.decode_limits())
            .inspect_err(|err| tracing::debug!(%err, "rejecting multi-recipient payload"))?;

        Span::current().record("recipients", message.recipients.len());
        let groups = message.recipients_by_identifier();

        let mut resolved = BTreeMap::new();
        let mut unresolved = Vec::new();
        for identifier in groups.keys() {
            match self.directory.resolve(identifier).await {
                Some(account) => {
                    resolved.insert(*identifier, account);
                },
                None => unresolved.push(*identifier),
            }
        }

        let now = self.env.now_millis();
        let mut mismatched = Vec::new();
        let mut stale = Vec::new();
        for (identifier, recipients) in &groups {
            let Some(account) = resolved.get(identifier) else {
                continue;
            };

            let claimed: ClaimedDevices =
                recipients.iter().map(|r| (r.device_id, r.registration_id)).collect();

            match reconcile(&account.device_set(now), &claimed) {
                Reconciliation::Match => {},
                Reconciliation::Mismatched { missing, extra } => {
                    mismatched.push(AccountMismatchedDevices {
                        uuid: *identifier,
                        devices: MismatchedDevices { missing_devices: missing, extra_devices: extra },
                    });
                },
                Reconciliation::Stale { stale: devices } => {
                    stale.push(AccountStaleDevices {
                        uuid: *identifier,
                        devices: StaleDevices { stale_devices: devices },
                    });
                },
            }
        }

        if !mismatched.is_empty() {
            tracing::debug!(accounts = mismatched.len(), "mismatched devices");
            return Err(DispatchError::AccountsMismatched(mismatched));
        }
        if !stale.is_empty() {
            tracing::debug!(accounts = stale.len(), "stale devices");
            return Err(DispatchError::AccountsStale(stale));
        }

        access::check_multi(
            request.combined_access_key.as_ref(),
            &resolved,
            &unresolved,
            request.story,
        )
        .inspect_err(|err| tracing::debug!(%err, "access denied"))?;

        if !unresolved.is_empty() {
            tracing::debug!(dropped = unresolved.len(), "skipping unresolved story recipients");
        }

        let mut tasks = Vec::with_capacity(message.recipients.len());
        for (identifier, recipients) in &groups {
            let Some(account) = resolved.get(identifier) else {
                continue;
            };

            for recipient in recipients {
                let envelope = Envelope {
                    envelope_type: EnvelopeType::UnidentifiedSender,
                    timestamp: request.timestamp,
                    server_timestamp: now,
                    source: None,
                    destination: *identifier,
                    content: message.content_for(recipient),
                    urgent: request.urgent,
                    story: request.story,
                    server_guid: self.env.random_uuid(),
                };

                tasks.push(self.task(account, *identifier, recipient.device_id, envelope, request.online));
            }
        }

        let outcomes = self.execute(tasks).await?;
        let uuids404 = unreachable_identifiers(&outcomes);
        tracing::debug!(delivered = outcomes.len(), unreachable = uuids404.len(), "multi-recipient send complete");

        Ok(SendMultiRecipientMessageResponse { uuids404 })
    }

    /// Deliver one message per device of a single destination.
    ///
    /// A destination that does not exist is reported as delivered.
    #[tracing::instrument(
        name = "single_recipient",
        skip_all,
        fields(story = request.story, messages = request.body.messages.len())
    )]
    pub async fn send_message(
        &self,
        request: SingleRecipientRequest,
    ) -> Result<SendMessageResponse, DispatchError> {
        let credential = match (request.sender, request.access_key) {
            (Some(_), Some(_)) => return Err(DispatchError::ConflictingCredentials),
            (Some(sender), None) => Credential::Authenticated(sender),
            (None, Some(key)) => Credential::Unidentified(key),
            (None, None) => Credential::Anonymous,
        };

        let body = request.body;
        let mut contents = Vec::with_capacity(body.messages.len());
        for (index, message) in body.messages.iter().enumerate() {
            let content =
                message.decoded_content().map_err(|_| DispatchError::InvalidContent { index })?;

            if content.len() > self.config.max_content_bytes {
                return Err(DispatchError::ContentTooLarge {
                    len: content.len(),
                    max: self.config.max_content_bytes,
                });
            }
            if !message.envelope_type.is_client_submittable() {
                return Err(DispatchError::ForbiddenEnvelopeType { index });
            }

            contents.push(Bytes::from(content));
        }

        let mut claimed = ClaimedDevices::new();
        for message in &body.messages {
            let device_id = message.destination_device_id;
            if claimed.insert(device_id, message.destination_registration_id).is_some() {
                return Err(DispatchError::DuplicateDevice(device_id));
            }
        }

        let destination = self.directory.resolve(&request.destination).await;
        let now = self.env.now_millis();

        let sync_sender = credential.sender().filter(|sender| {
            destination.as_ref().is_some_and(|account| account.aci == sender.account.aci)
        });

        if let Some(account) = &destination {
            let mut devices = account.device_set(now);
            if let Some(sender) = sync_sender {
                devices = devices.without(sender.device_id);
            }

            match reconcile(&devices, &claimed) {
                Reconciliation::Match => {},
                Reconciliation::Mismatched { missing, extra } => {
                    tracing::debug!(?missing, ?extra, "mismatched devices");
                    return Err(DispatchError::MismatchedDevices(MismatchedDevices {
                        missing_devices: missing,
                        extra_devices: extra,
                    }));
                },
                Reconciliation::Stale { stale } => {
                    tracing::debug!(?stale, "stale devices");
                    return Err(DispatchError::StaleDevices(StaleDevices { stale_devices: stale }));
                },
            }
        }

        access::check_single(&credential, destination.as_deref(), request.story, now)
            .inspect_err(|err| tracing::debug!(%err, "access denied"))?;

        let Some(account) = destination else {
            tracing::debug!("destination not found, reporting success");
            return Ok(SendMessageResponse { needs_sync: false });
        };

        let needs_sync = credential.sender().is_some_and(|sender| {
            sync_sender.is_none() && sender.account.enabled_device_count(now) > 1
        });

        let source = credential
            .sender()
            .map(|sender| EnvelopeSource { aci: sender.account.aci, device_id: sender.device_id });

        let tasks = body
            .messages
            .iter()
            .zip(contents)
            .map(|(message, content)| {
                let envelope = Envelope {
                    envelope_type: message.envelope_type,
                    timestamp: body.timestamp,
                    server_timestamp: now,
                    source,
                    destination: request.destination,
                    content,
                    urgent: body.urgent,
                    story: request.story,
                    server_guid: self.env.random_uuid(),
                };
                self.task(&account, request.destination, message.destination_device_id, envelope, body.online)
            })
            .collect();

        let outcomes = self.execute(tasks).await?;
        let unreachable = unreachable_identifiers(&outcomes);
        tracing::debug!(delivered = outcomes.len(), unreachable = unreachable.len(), "send complete");

        Ok(SendMessageResponse { needs_sync })
    }

    fn task(
        &self,
        account: &Arc<Account>,
        destination: ServiceIdentifier,
        device_id: u64,
        envelope: Envelope,
        online: bool,
    ) -> DeliveryTask {
        DeliveryTask {
            sender: Arc::clone(&self.sender),
            account: Arc::clone(account),
            destination,
            device_id,
            envelope,
            online,
        }
    }

    async fn execute(&self, tasks: Vec<DeliveryTask>) -> Result<Vec<DeliveryOutcome>, DispatchError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let units = tasks.len();
        self.pool.execute_all(tasks).await.map_err(|err| {
            tracing::error!(%err, units, "worker pool failed to run batch");
            DispatchError::Pool(err)
        })
    }
}

/// Identifiers with at least one unregistered device, deduplicated and
/// ordered. Other unit failures are logged and otherwise ignored.
fn unreachable_identifiers(outcomes: &[DeliveryOutcome]) -> Vec<ServiceIdentifier> {
    let mut unreachable = BTreeSet::new();

    for outcome in outcomes {
        match &outcome.result {
            Ok(()) => {},
            Err(DeliveryError::NotRegistered) => {
                tracing::debug!(
                    destination = %outcome.destination,
                    device_id = outcome.device_id,
                    "device not registered"
                );
                unreachable.insert(outcome.destination);
            },
            Err(DeliveryError::Failed(reason)) => {
                tracing::warn!(
                    destination = %outcome.destination,
                    device_id = outcome.device_id,
                    %reason,
                    "delivery failed"
                );
            },
        }
    }

    unreachable.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use base64::{Engine, engine::general_purpose::STANDARD};
    use sealpost_proto::{
        DeviceId, IdentifierEncoding, IncomingMessage, KEY_MATERIAL_LEN, Recipient,
    };
    use uuid::Uuid;

    use super::*;
    use crate::{
        account::{ACCESS_KEY_LEN, Device},
        delivery::PoolError,
        env::test_env::FixedEnv,
    };

    const NOW: u64 = 1_700_000_000_000;

    struct Directory {
        accounts: Vec<Arc<Account>>,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl AccountDirectory for Directory {
        async fn resolve(&self, identifier: &ServiceIdentifier) -> Option<Arc<Account>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.accounts.iter().find(|a| a.is_identified_by(identifier)).cloned()
        }
    }

    #[derive(Default)]
    struct Sender {
        sent: Mutex<Vec<(ServiceIdentifier, DeviceId, Envelope)>>,
        unregistered: Vec<DeviceId>,
    }

    #[async_trait]
    impl MessageSender for Sender {
        async fn send(
            &self,
            _account: &Account,
            device_id: DeviceId,
            envelope: Envelope,
            _online: bool,
        ) -> Result<(), DeliveryError> {
            if self.unregistered.contains(&device_id) {
                return Err(DeliveryError::NotRegistered);
            }
            self.sent.lock().expect("lock").push((envelope.destination, device_id, envelope));
            Ok(())
        }
    }

    #[derive(Default)]
    struct Pool {
        batches: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl WorkerPool for Pool {
        async fn execute_all(
            &self,
            tasks: Vec<DeliveryTask>,
        ) -> Result<Vec<DeliveryOutcome>, PoolError> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PoolError::Saturated { requested: tasks.len(), available: 0 });
            }
            let mut outcomes = Vec::with_capacity(tasks.len());
            for task in tasks {
                outcomes.push(task.run().await);
            }
            Ok(outcomes)
        }
    }

    struct Fixture {
        engine: DispatchEngine<FixedEnv>,
        directory: Arc<Directory>,
        sender: Arc<Sender>,
        pool: Arc<Pool>,
    }

    fn device(id: DeviceId, registration_id: u16) -> Device {
        Device {
            id,
            registration_id,
            fetches_messages: true,
            apn_token: None,
            fcm_token: None,
            has_signed_pre_key: true,
            created_millis: NOW,
            last_seen_millis: NOW,
        }
    }

    fn key(byte: u8) -> AccessKey {
        AccessKey::from_bytes([byte; ACCESS_KEY_LEN])
    }

    fn alice() -> Arc<Account> {
        Arc::new(Account {
            aci: Uuid::from_u128(0xa1),
            pni: Uuid::from_u128(0xa2),
            devices: vec![device(1, 111), device(2, 222)],
            access_key: Some(key(0x11)),
        })
    }

    fn bob() -> Arc<Account> {
        Arc::new(Account {
            aci: Uuid::from_u128(0xb1),
            pni: Uuid::from_u128(0xb2),
            devices: vec![device(1, 333)],
            access_key: Some(key(0x22)),
        })
    }

    fn fixture_with(sender: Sender, pool: Pool) -> Fixture {
        let directory =
            Arc::new(Directory { accounts: vec![alice(), bob()], lookups: AtomicUsize::new(0) });
        let sender = Arc::new(sender);
        let pool = Arc::new(pool);
        let engine = DispatchEngine::new(
            FixedEnv::at(NOW),
            directory.clone(),
            sender.clone(),
            pool.clone(),
            DispatchConfig::default(),
        );
        Fixture { engine, directory, sender, pool }
    }

    fn fixture() -> Fixture {
        fixture_with(Sender::default(), Pool::default())
    }

    fn recipient(identifier: ServiceIdentifier, device_id: DeviceId, registration_id: u16) -> Recipient {
        Recipient { identifier, device_id, registration_id, key_material: [device_id as u8; KEY_MATERIAL_LEN] }
    }

    fn multi(recipients: Vec<Recipient>, key: Option<AccessKey>, story: bool) -> MultiRecipientRequest {
        let body = MultiRecipientMessage {
            encoding: IdentifierEncoding::Explicit,
            recipients,
            shared_payload: Bytes::from(vec![9u8; 39]),
        }
        .to_bytes()
        .expect("encode");

        MultiRecipientRequest {
            body,
            combined_access_key: key,
            timestamp: 1234,
            online: false,
            urgent: true,
            story,
        }
    }

    fn alice_both_devices() -> Vec<Recipient> {
        let alice = alice().aci_identifier();
        vec![recipient(alice, 1, 111), recipient(alice, 2, 222)]
    }

    #[tokio::test]
    async fn multi_delivers_to_every_device() {
        let f = fixture();
        let bob = bob().aci_identifier();
        let mut recipients = alice_both_devices();
        recipients.push(recipient(bob, 1, 333));

        let response = f
            .engine
            .send_multi_recipient(multi(recipients, Some(key(0x11).xor(&key(0x22))), false))
            .await
            .expect("send");

        assert!(response.uuids404.is_empty());
        assert_eq!(f.pool.batches.load(Ordering::SeqCst), 1);
        assert_eq!(f.directory.lookups.load(Ordering::SeqCst), 2);

        let sent = f.sender.sent.lock().expect("lock");
        assert_eq!(sent.len(), 3);
        for (_, device_id, envelope) in sent.iter() {
            assert_eq!(envelope.envelope_type, EnvelopeType::UnidentifiedSender);
            assert!(envelope.source.is_none());
            assert_eq!(envelope.server_timestamp, NOW);
            assert_eq!(envelope.content.len(), KEY_MATERIAL_LEN + 39);
            assert_eq!(envelope.content[0], *device_id as u8);
        }
    }

    #[tokio::test]
    async fn multi_duplicate_recipient_touches_nothing() {
        let f = fixture();
        let alice = alice().aci_identifier();
        let recipients =
            vec![recipient(alice, 1, 111), recipient(alice, 2, 222), recipient(alice, 1, 111)];

        let err = f
            .engine
            .send_multi_recipient(multi(recipients, Some(key(0x11)), false))
            .await
            .expect_err("duplicate");

        assert_eq!(err.status(), 422);
        assert_eq!(f.directory.lookups.load(Ordering::SeqCst), 0);
        assert_eq!(f.pool.batches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn multi_wrong_key_is_unauthorized() {
        let f = fixture();
        let err = f
            .engine
            .send_multi_recipient(multi(alice_both_devices(), Some(key(0x12)), false))
            .await
            .expect_err("wrong key");

        assert_eq!(err, DispatchError::Unauthorized);
        assert_eq!(f.pool.batches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn multi_story_ignores_key_and_unknown_recipients() {
        let f = fixture();
        let mut recipients = alice_both_devices();
        recipients.push(recipient(ServiceIdentifier::Aci(Uuid::from_u128(0xdead)), 1, 1));

        let response = f
            .engine
            .send_multi_recipient(multi(recipients.clone(), None, true))
            .await
            .expect("story");
        assert!(response.uuids404.is_empty());
        assert_eq!(f.sender.sent.lock().expect("lock").len(), 2);

        let err = f
            .engine
            .send_multi_recipient(multi(recipients, Some(key(0x11)), false))
            .await
            .expect_err("not a story");
        assert_eq!(err, DispatchError::NotFound(vec![ServiceIdentifier::Aci(Uuid::from_u128(0xdead))]));
    }

    #[tokio::test]
    async fn multi_reports_unregistered_devices() {
        let f = fixture_with(Sender { unregistered: vec![2], ..Sender::default() }, Pool::default());

        let response = f
            .engine
            .send_multi_recipient(multi(alice_both_devices(), Some(key(0x11)), false))
            .await
            .expect("send");

        assert_eq!(response.uuids404, vec![alice().aci_identifier()]);
    }

    #[tokio::test]
    async fn multi_pool_failure_is_fatal() {
        let f = fixture_with(Sender::default(), Pool { fail: true, ..Pool::default() });

        let err = f
            .engine
            .send_multi_recipient(multi(alice_both_devices(), Some(key(0x11)), false))
            .await
            .expect_err("pool failure");

        assert!(err.is_fatal());
        assert_eq!(err.status(), 500);
        assert!(f.sender.sent.lock().expect("lock").is_empty());
    }

    fn message(device_id: DeviceId, registration_id: u16) -> IncomingMessage {
        IncomingMessage {
            envelope_type: EnvelopeType::Ciphertext,
            destination_device_id: device_id,
            destination_registration_id: registration_id,
            content: STANDARD.encode(b"ciphertext"),
        }
    }

    fn single(
        destination: ServiceIdentifier,
        sender: Option<AuthenticatedSender>,
        access_key: Option<AccessKey>,
        messages: Vec<IncomingMessage>,
    ) -> SingleRecipientRequest {
        SingleRecipientRequest {
            destination,
            sender,
            access_key,
            story: false,
            body: IncomingMessageList { messages, online: false, urgent: true, timestamp: 1234 },
        }
    }

    #[tokio::test]
    async fn single_sealed_sender_delivers() {
        let f = fixture();
        let request = single(
            alice().pni_identifier(),
            None,
            Some(key(0x11)),
            vec![message(1, 111), message(2, 222)],
        );

        let response = f.engine.send_message(request).await.expect("send");
        assert!(!response.needs_sync);

        let sent = f.sender.sent.lock().expect("lock");
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(destination, _, envelope)| {
            *destination == alice().pni_identifier() && envelope.source.is_none()
        }));
    }

    #[tokio::test]
    async fn single_authenticated_sender_needs_sync() {
        let f = fixture();
        let sender = AuthenticatedSender { account: alice(), device_id: 1 };
        let request = single(bob().aci_identifier(), Some(sender), None, vec![message(1, 333)]);

        let response = f.engine.send_message(request).await.expect("send");
        assert!(response.needs_sync);

        let sent = f.sender.sent.lock().expect("lock");
        assert_eq!(sent[0].2.source, Some(EnvelopeSource { aci: alice().aci, device_id: 1 }));
    }

    #[tokio::test]
    async fn single_sync_message_excludes_sending_device() {
        let f = fixture();
        let sender = AuthenticatedSender { account: alice(), device_id: 1 };
        let request = single(alice().aci_identifier(), Some(sender), None, vec![message(2, 222)]);

        let response = f.engine.send_message(request).await.expect("sync");
        assert!(!response.needs_sync);
    }

    #[tokio::test]
    async fn single_rejects_duplicate_devices_before_lookup() {
        let f = fixture();
        let request =
            single(alice().aci_identifier(), None, Some(key(0x11)), vec![message(1, 111), message(1, 111)]);

        let err = f.engine.send_message(request).await.expect_err("duplicate");
        assert_eq!(err, DispatchError::DuplicateDevice(1));
        assert_eq!(f.directory.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn single_reports_mismatch_and_stale() {
        let f = fixture();

        let request = single(alice().aci_identifier(), None, Some(key(0x11)), vec![message(1, 111)]);
        let err = f.engine.send_message(request).await.expect_err("missing");
        assert_eq!(
            err,
            DispatchError::MismatchedDevices(MismatchedDevices {
                missing_devices: vec![2],
                extra_devices: vec![],
            })
        );

        let request =
            single(alice().aci_identifier(), None, Some(key(0x11)), vec![message(1, 111), message(2, 999)]);
        let err = f.engine.send_message(request).await.expect_err("stale");
        assert_eq!(err, DispatchError::StaleDevices(StaleDevices { stale_devices: vec![2] }));
    }

    #[tokio::test]
    async fn single_unknown_destination_is_masked() {
        let f = fixture();
        let request = single(
            ServiceIdentifier::Aci(Uuid::from_u128(0xdead)),
            None,
            Some(key(0x11)),
            vec![message(1, 1)],
        );

        let response = f.engine.send_message(request).await.expect("masked");
        assert!(!response.needs_sync);
        assert_eq!(f.pool.batches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn single_rejects_server_receipts_and_conflicting_credentials() {
        let f = fixture();

        let mut receipt = message(1, 111);
        receipt.envelope_type = EnvelopeType::ServerDeliveryReceipt;
        let request = single(alice().aci_identifier(), None, Some(key(0x11)), vec![receipt]);
        assert_eq!(f.engine.send_message(request).await.map_err(|e| e.status()), Err(400));

        let sender = AuthenticatedSender { account: bob(), device_id: 1 };
        let request =
            single(alice().aci_identifier(), Some(sender), Some(key(0x11)), vec![message(1, 111)]);
        assert_eq!(
            f.engine.send_message(request).await,
            Err(DispatchError::ConflictingCredentials)
        );
    }
}

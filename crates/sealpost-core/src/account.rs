//! Accounts, devices and access keys.
//!
//! The dispatch engine only reads accounts. Storage lives behind
//! [`AccountDirectory`](crate::directory::AccountDirectory).
//!
//! # Invariants
//!
//! - An account's ACI and PNI address the same devices with the same
//!   registration ids.
//! - Only enabled devices enter the [`DeviceSet`] used for reconciliation.

use std::collections::BTreeMap;

use sealpost_proto::{DeviceId, RegistrationId, ServiceIdentifier};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Id of every account's primary device.
pub const PRIMARY_DEVICE_ID: DeviceId = 1;

/// Length of an unidentified access key.
pub const ACCESS_KEY_LEN: usize = 16;

/// A linked (non-primary) device unseen for this long is disabled.
pub const DEVICE_ACTIVITY_WINDOW_MILLIS: u64 = 30 * 24 * 60 * 60 * 1000;

/// Per-account key gating sealed-sender delivery.
///
/// Keys combine with XOR so a multi-recipient sender can prove knowledge of
/// every recipient's key with a single value.
///
/// # Security
///
/// Equality is constant time. The `Debug` impl redacts the key bytes.
#[derive(Clone, Copy, Default)]
pub struct AccessKey([u8; ACCESS_KEY_LEN]);

impl AccessKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; ACCESS_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Wrap a slice, which must be exactly 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; ACCESS_KEY_LEN]>::try_from(bytes).ok().map(Self)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; ACCESS_KEY_LEN] {
        &self.0
    }

    /// Bytewise XOR of two keys.
    #[must_use]
    pub fn xor(&self, other: &Self) -> Self {
        let mut out = self.0;
        for (byte, other) in out.iter_mut().zip(other.0.iter()) {
            *byte ^= other;
        }
        Self(out)
    }

    /// XOR of every key in `keys`. The empty combination is all zeros.
    pub fn combine<'a>(keys: impl IntoIterator<Item = &'a AccessKey>) -> Self {
        keys.into_iter().fold(Self::default(), |acc, key| acc.xor(key))
    }
}

impl ConstantTimeEq for AccessKey {
    fn ct_eq(&self, other: &Self) -> subtle::Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for AccessKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for AccessKey {}

impl std::fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccessKey(<redacted {ACCESS_KEY_LEN} bytes>)")
    }
}

/// One device registered to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Device id, primary is `1`
    pub id: DeviceId,
    /// Current key-material epoch
    pub registration_id: RegistrationId,
    /// Device polls for messages over its own connection
    #[serde(default)]
    pub fetches_messages: bool,
    /// APNs push token
    #[serde(default)]
    pub apn_token: Option<String>,
    /// FCM push token
    #[serde(default)]
    pub fcm_token: Option<String>,
    /// Device has uploaded a signed pre-key
    #[serde(default)]
    pub has_signed_pre_key: bool,
    /// Creation time (ms)
    #[serde(default)]
    pub created_millis: u64,
    /// Last activity (ms)
    #[serde(default)]
    pub last_seen_millis: u64,
}

impl Device {
    /// Returns true for the account's primary device.
    pub fn is_primary(&self) -> bool {
        self.id == PRIMARY_DEVICE_ID
    }

    /// Returns true if the server has some way to reach the device.
    pub fn has_delivery_channel(&self) -> bool {
        self.fetches_messages || self.apn_token.is_some() || self.fcm_token.is_some()
    }

    /// Returns true if the device can receive messages at `now_millis`.
    ///
    /// A device is enabled when it is reachable, has a signed pre-key, and
    /// is either the primary or was seen within the activity window.
    pub fn is_enabled(&self, now_millis: u64) -> bool {
        let recently_seen =
            now_millis.saturating_sub(self.last_seen_millis) < DEVICE_ACTIVITY_WINDOW_MILLIS;

        self.has_delivery_channel()
            && self.has_signed_pre_key
            && (self.is_primary() || recently_seen)
    }
}

/// Authoritative state of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    /// Current key-material epoch
    pub registration_id: RegistrationId,
    /// Whether the device counts for reconciliation
    pub enabled: bool,
}

/// Authoritative device map of one account, ordered by device id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSet(BTreeMap<DeviceId, DeviceState>);

impl DeviceSet {
    /// Build from `(device id, state)` pairs.
    pub fn new(devices: impl IntoIterator<Item = (DeviceId, DeviceState)>) -> Self {
        Self(devices.into_iter().collect())
    }

    /// State of one device.
    pub fn get(&self, device_id: DeviceId) -> Option<&DeviceState> {
        self.0.get(&device_id)
    }

    /// Enabled devices with their registration ids, in id order.
    pub fn enabled(&self) -> impl Iterator<Item = (DeviceId, RegistrationId)> + '_ {
        self.0.iter().filter(|(_, state)| state.enabled).map(|(id, state)| (*id, state.registration_id))
    }

    /// Number of enabled devices.
    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }

    /// Copy of the set without one device.
    ///
    /// A sender syncing to its own account does not address the device it is
    /// sending from.
    #[must_use]
    pub fn without(&self, device_id: DeviceId) -> Self {
        let mut devices = self.0.clone();
        devices.remove(&device_id);
        Self(devices)
    }
}

/// An account as seen by the dispatch engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Account identifier
    pub aci: Uuid,
    /// Phone-number identifier
    pub pni: Uuid,
    /// Registered devices
    pub devices: Vec<Device>,
    /// Sealed-sender access key, if the account accepts sealed sender
    pub access_key: Option<AccessKey>,
}

impl Account {
    /// The ACI form of this account's address.
    pub fn aci_identifier(&self) -> ServiceIdentifier {
        ServiceIdentifier::Aci(self.aci)
    }

    /// The PNI form of this account's address.
    pub fn pni_identifier(&self) -> ServiceIdentifier {
        ServiceIdentifier::Pni(self.pni)
    }

    /// Returns true if `identifier` addresses this account.
    pub fn is_identified_by(&self, identifier: &ServiceIdentifier) -> bool {
        match identifier {
            ServiceIdentifier::Aci(uuid) => *uuid == self.aci,
            ServiceIdentifier::Pni(uuid) => *uuid == self.pni,
        }
    }

    /// Look up one device.
    pub fn device(&self, device_id: DeviceId) -> Option<&Device> {
        self.devices.iter().find(|device| device.id == device_id)
    }

    /// The primary device, if registered.
    pub fn primary_device(&self) -> Option<&Device> {
        self.device(PRIMARY_DEVICE_ID)
    }

    /// An account is enabled when its primary device is.
    pub fn is_enabled(&self, now_millis: u64) -> bool {
        self.primary_device().is_some_and(|device| device.is_enabled(now_millis))
    }

    /// Authoritative device map at `now_millis`.
    pub fn device_set(&self, now_millis: u64) -> DeviceSet {
        DeviceSet::new(self.devices.iter().map(|device| {
            (
                device.id,
                DeviceState {
                    registration_id: device.registration_id,
                    enabled: device.is_enabled(now_millis),
                },
            )
        }))
    }

    /// Number of devices enabled at `now_millis`.
    pub fn enabled_device_count(&self, now_millis: u64) -> usize {
        self.devices.iter().filter(|device| device.is_enabled(now_millis)).count()
    }
}

//! Operations for model-based testing.
//!
//! Operations are generated randomly by proptest and applied to both the
//! model and the real engine. Indices are kept small so generated cases hit
//! the same accounts and devices often.

use arbitrary::Arbitrary;
use sealpost_proto::{DeviceId, RegistrationId, ServiceIdentifier};
use uuid::Uuid;

/// Account index (0-indexed). Indices past the world's account count
/// address identifiers that do not exist.
pub type AccountIndex = u8;

/// Largest device id an account can register.
pub const MAX_MODEL_DEVICES: u8 = 4;

/// Offset between a device's registration id and a stale one.
pub const STALE_OFFSET: RegistrationId = 1000;

/// Shape of one account in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub struct AccountSpec {
    /// Number of registered devices, reduced into `1..=MAX_MODEL_DEVICES`
    pub devices: u8,
    /// Whether the account accepts sealed sender
    pub has_access_key: bool,
}

impl AccountSpec {
    /// Registered device ids.
    pub fn device_ids(&self) -> impl Iterator<Item = DeviceId> {
        1..=DeviceId::from(self.devices % MAX_MODEL_DEVICES + 1)
    }
}

/// An identifier as the client addresses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Arbitrary)]
pub struct ModelIdentifier {
    /// Target account
    pub account: AccountIndex,
    /// Address the account by its PNI instead of its ACI
    pub pni: bool,
}

impl ModelIdentifier {
    /// Real identifier for this address.
    pub fn service_identifier(self) -> ServiceIdentifier {
        if self.pni { ServiceIdentifier::Pni(pni(self.account)) } else { ServiceIdentifier::Aci(aci(self.account)) }
    }
}

/// ACI of account `index`.
pub fn aci(index: AccountIndex) -> Uuid {
    Uuid::from_u128(0xa000 + u128::from(index))
}

/// PNI of account `index`.
pub fn pni(index: AccountIndex) -> Uuid {
    Uuid::from_u128(0xb000 + u128::from(index))
}

/// Registration id of a device.
pub fn registration_id(account: AccountIndex, device_id: DeviceId) -> RegistrationId {
    RegistrationId::from(account) * 10 + RegistrationId::try_from(device_id).unwrap_or(0)
}

/// One addressed device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub struct ModelDevice {
    /// Device id, reduced into `1..=MAX_MODEL_DEVICES + 1` so unknown devices
    /// are reachable
    pub device: u8,
    /// Claim an outdated registration id
    pub stale: bool,
}

impl ModelDevice {
    /// Real device id.
    pub fn device_id(self) -> DeviceId {
        DeviceId::from(self.device % (MAX_MODEL_DEVICES + 1) + 1)
    }

    /// Claimed registration id for `account`.
    pub fn claimed_registration_id(self, account: AccountIndex) -> RegistrationId {
        let current = registration_id(account, self.device_id());
        if self.stale { current + STALE_OFFSET } else { current }
    }
}

/// One multi-recipient record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub struct ModelRecipient {
    /// Addressed identifier
    pub identifier: ModelIdentifier,
    /// Addressed device
    pub device: ModelDevice,
}

/// Access key a request presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum KeyChoice {
    /// The key the gate expects
    Correct,
    /// Some other key
    Wrong,
    /// No key
    Missing,
}

/// Operations that can be applied to the system.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Multi-recipient send.
    SendMulti {
        /// Records in wire order
        recipients: Vec<ModelRecipient>,
        /// Combined access key
        key: KeyChoice,
        /// Story broadcast
        story: bool,
    },

    /// Single-recipient send.
    SendSingle {
        /// Destination
        destination: ModelIdentifier,
        /// Authenticated sender account and device
        sender: Option<(AccountIndex, u8)>,
        /// Sealed-sender access key
        key: KeyChoice,
        /// Addressed devices
        devices: Vec<ModelDevice>,
        /// Story broadcast
        story: bool,
    },

    /// Revoke a device's signed pre-key, disabling it.
    DisableDevice {
        /// Account
        account: AccountIndex,
        /// Device, reduced like [`ModelDevice::device`]
        device: u8,
    },

    /// Make a device report not-registered on delivery.
    UnregisterDevice {
        /// Account
        account: AccountIndex,
        /// Device, reduced like [`ModelDevice::device`]
        device: u8,
    },
}

impl Operation {
    /// Reduce account indices into `0..=accounts`, so one past the last
    /// account stands for an unknown identifier.
    #[must_use]
    pub fn clamp(self, accounts: usize) -> Self {
        let modulus = u8::try_from(accounts + 1).unwrap_or(u8::MAX);
        let clamp = |index: AccountIndex| index % modulus;
        let clamp_id = |id: ModelIdentifier| ModelIdentifier { account: clamp(id.account), ..id };
        let sender_modulus = modulus.saturating_sub(1).max(1);

        match self {
            Self::SendMulti { recipients, key, story } => Self::SendMulti {
                recipients: recipients
                    .into_iter()
                    .map(|r| ModelRecipient { identifier: clamp_id(r.identifier), ..r })
                    .collect(),
                key,
                story,
            },
            Self::SendSingle { destination, sender, key, devices, story } => Self::SendSingle {
                destination: clamp_id(destination),
                sender: sender.map(|(account, device)| (account % sender_modulus, device)),
                key,
                devices,
                story,
            },
            Self::DisableDevice { account, device } => {
                Self::DisableDevice { account: clamp(account), device }
            },
            Self::UnregisterDevice { account, device } => {
                Self::UnregisterDevice { account: clamp(account), device }
            },
        }
    }
}

/// Result of applying an operation.
///
/// Used to compare model and real system behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Multi-recipient send accepted.
    Multi {
        /// Identifiers reported unreachable, ordered
        uuids404: Vec<ServiceIdentifier>,
        /// Units delivered
        deliveries: usize,
    },

    /// Single-recipient send accepted.
    Single {
        /// Sender should sync its other devices
        needs_sync: bool,
        /// Units delivered
        deliveries: usize,
    },

    /// Request rejected with the given status.
    Rejected(u16),

    /// Directory or transport state changed.
    Updated,
}

impl OperationResult {
    /// Check if the operation succeeded.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }

    /// Status code, 200 for anything accepted.
    pub fn status(&self) -> u16 {
        match self {
            Self::Rejected(status) => *status,
            _ => 200,
        }
    }
}

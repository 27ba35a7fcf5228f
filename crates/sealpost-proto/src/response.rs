//! Response bodies.
//!
//! Each terminal state of a send maps to one of these JSON shapes. Identifiers
//! serialize in their text form, so a PNI-addressed recipient comes back as
//! `PNI:<uuid>`.

use serde::{Deserialize, Serialize};

use crate::{DeviceId, ServiceIdentifier};

/// Device-topology mismatch for one account (409).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MismatchedDevices {
    /// Enabled devices the request did not address
    pub missing_devices: Vec<DeviceId>,
    /// Addressed devices that are unknown or disabled
    pub extra_devices: Vec<DeviceId>,
}

/// Outdated registration ids for one account (410).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaleDevices {
    /// Devices whose registration id differs from the claimed one
    pub stale_devices: Vec<DeviceId>,
}

/// [`MismatchedDevices`] keyed by the identifier the client used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMismatchedDevices {
    /// Identifier as addressed
    pub uuid: ServiceIdentifier,
    /// Mismatch detail
    pub devices: MismatchedDevices,
}

/// [`StaleDevices`] keyed by the identifier the client used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStaleDevices {
    /// Identifier as addressed
    pub uuid: ServiceIdentifier,
    /// Stale detail
    pub devices: StaleDevices,
}

/// Successful single-recipient send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    /// The sender has other devices that should receive a sync copy
    pub needs_sync: bool,
}

/// Successful multi-recipient send, or the 404 body of a non-story send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMultiRecipientMessageResponse {
    /// Identifiers that could not be reached, deduplicated and ordered
    pub uuids404: Vec<ServiceIdentifier>,
}

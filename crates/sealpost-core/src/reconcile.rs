//! Device-set reconciliation.
//!
//! Compares the devices a client addressed for one account with the
//! account's enabled devices.
//!
//! # Invariants
//!
//! - Topology first: if the claimed and enabled id sets differ, the result
//!   is [`Reconciliation::Mismatched`] whatever the registration ids are.
//! - Stale only on equal topology: [`Reconciliation::Stale`] is returned
//!   only when both id sets are equal and some registration id differs.
//! - Pure: the result depends on nothing but the two inputs. Output lists
//!   are sorted by device id.

use std::collections::BTreeMap;

use sealpost_proto::{DeviceId, RegistrationId};

use crate::account::DeviceSet;

/// Devices a request addressed for one account, by id.
pub type ClaimedDevices = BTreeMap<DeviceId, RegistrationId>;

/// Result of reconciling one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Claimed set equals the enabled set, registration ids included.
    Match,

    /// The client's view of the device topology is outdated.
    Mismatched {
        /// Enabled devices not addressed
        missing: Vec<DeviceId>,
        /// Addressed devices that are unknown or disabled
        extra: Vec<DeviceId>,
    },

    /// Topology is right but some devices rotated their key material.
    Stale {
        /// Devices whose registration id differs
        stale: Vec<DeviceId>,
    },
}

impl Reconciliation {
    /// Returns true for [`Reconciliation::Match`].
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

/// Reconcile `claimed` against the enabled devices of `authoritative`.
pub fn reconcile(authoritative: &DeviceSet, claimed: &ClaimedDevices) -> Reconciliation {
    let enabled: BTreeMap<DeviceId, RegistrationId> = authoritative.enabled().collect();

    let missing: Vec<DeviceId> =
        enabled.keys().filter(|id| !claimed.contains_key(*id)).copied().collect();
    let extra: Vec<DeviceId> =
        claimed.keys().filter(|id| !enabled.contains_key(*id)).copied().collect();

    if !missing.is_empty() || !extra.is_empty() {
        return Reconciliation::Mismatched { missing, extra };
    }

    let stale: Vec<DeviceId> = claimed
        .iter()
        .filter(|&(id, registration_id)| enabled.get(id) != Some(registration_id))
        .map(|(id, _)| *id)
        .collect();

    if stale.is_empty() { Reconciliation::Match } else { Reconciliation::Stale { stale } }
}

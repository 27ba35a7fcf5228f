//! Access gate.
//!
//! Decides whether a request may deliver to its recipients.
//!
//! # Security
//!
//! - Key comparison is constant time.
//! - Stories skip the gate entirely, including the existence check.
//! - A single-recipient request never learns whether its destination exists:
//!   an unresolved destination passes the gate and is dropped later.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use sealpost_proto::{DeviceId, ServiceIdentifier};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::account::{AccessKey, Account};

/// Sender authenticated by the transport layer.
#[derive(Debug, Clone)]
pub struct AuthenticatedSender {
    /// Sender's account
    pub account: Arc<Account>,
    /// Device the request came from
    pub device_id: DeviceId,
}

/// How a single-recipient request identifies itself.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Authenticated sender
    Authenticated(AuthenticatedSender),
    /// Sealed sender, proving knowledge of the destination's access key
    Unidentified(AccessKey),
    /// No credential
    Anonymous,
}

impl Credential {
    /// The authenticated sender, if any.
    pub fn sender(&self) -> Option<&AuthenticatedSender> {
        match self {
            Self::Authenticated(sender) => Some(sender),
            Self::Unidentified(_) | Self::Anonymous => None,
        }
    }
}

/// Gate rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// Missing or wrong credential.
    #[error("unauthorized")]
    Unauthorized,

    /// Non-story multi-recipient send addressed unknown identifiers.
    #[error("{} recipients not found", .0.len())]
    NotFound(Vec<ServiceIdentifier>),
}

/// Gate a single-recipient send.
///
/// `destination` is `None` when the destination did not resolve.
pub fn check_single(
    credential: &Credential,
    destination: Option<&Account>,
    story: bool,
    now_millis: u64,
) -> Result<(), AccessError> {
    if story {
        return Ok(());
    }

    match credential {
        Credential::Authenticated(sender) => {
            if sender.account.is_enabled(now_millis) {
                Ok(())
            } else {
                Err(AccessError::Unauthorized)
            }
        },
        Credential::Unidentified(key) => match destination {
            Some(account) => check_key(key, account.access_key.as_ref()),
            None => Ok(()),
        },
        Credential::Anonymous => Err(AccessError::Unauthorized),
    }
}

/// Gate a multi-recipient send.
///
/// Unresolved identifiers fail a non-story send with
/// [`AccessError::NotFound`] before the combined key is checked. The
/// combined key must equal the XOR of the access keys of the distinct
/// resolved accounts; an account addressed by both its ACI and PNI counts
/// once.
pub fn check_multi(
    combined_key: Option<&AccessKey>,
    resolved: &BTreeMap<ServiceIdentifier, Arc<Account>>,
    unresolved: &[ServiceIdentifier],
    story: bool,
) -> Result<(), AccessError> {
    if story {
        return Ok(());
    }

    if !unresolved.is_empty() {
        return Err(AccessError::NotFound(unresolved.to_vec()));
    }

    let mut seen = BTreeSet::new();
    let mut keys = Vec::with_capacity(resolved.len());
    for account in resolved.values() {
        if seen.insert(account.aci) {
            keys.push(account.access_key.ok_or(AccessError::Unauthorized)?);
        }
    }

    check_key(combined_key.ok_or(AccessError::Unauthorized)?, Some(&AccessKey::combine(&keys)))
}

fn check_key(presented: &AccessKey, expected: Option<&AccessKey>) -> Result<(), AccessError> {
    match expected {
        Some(expected) if bool::from(presented.ct_eq(expected)) => Ok(()),
        _ => Err(AccessError::Unauthorized),
    }
}

//! Terminal failure states of a send.

use sealpost_proto::{
    AccountMismatchedDevices, AccountStaleDevices, DeviceId, MismatchedDevices, ServiceIdentifier,
    StaleDevices, WireError,
};
use thiserror::Error;

use crate::{access::AccessError, delivery::PoolError};

/// Why a send request did not reach the delivered state.
///
/// Every variant except [`DispatchError::Pool`] is raised before any
/// delivery unit runs, so the request had no side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Multi-recipient payload failed to decode.
    #[error("malformed payload: {0}")]
    Malformed(#[from] WireError),

    /// Both an authenticated sender and an access key were supplied.
    #[error("conflicting credentials")]
    ConflictingCredentials,

    /// A message body was not valid base64.
    #[error("message {index} has invalid content encoding")]
    InvalidContent {
        /// Position in the message list
        index: usize,
    },

    /// Clients may not submit server delivery receipts.
    #[error("message {index} has a forbidden envelope type")]
    ForbiddenEnvelopeType {
        /// Position in the message list
        index: usize,
    },

    /// A message body exceeds the content ceiling.
    #[error("content too large: {len} bytes (maximum {max})")]
    ContentTooLarge {
        /// Decoded body length
        len: usize,
        /// Configured ceiling
        max: usize,
    },

    /// The message list addressed one device twice.
    #[error("duplicate destination device {0}")]
    DuplicateDevice(DeviceId),

    /// Single-recipient device topology mismatch.
    #[error("mismatched devices")]
    MismatchedDevices(MismatchedDevices),

    /// Single-recipient stale registration ids.
    #[error("stale devices")]
    StaleDevices(StaleDevices),

    /// Multi-recipient topology mismatch, one entry per affected identifier.
    #[error("mismatched devices for {} recipients", .0.len())]
    AccountsMismatched(Vec<AccountMismatchedDevices>),

    /// Multi-recipient stale registration ids, one entry per affected
    /// identifier.
    #[error("stale devices for {} recipients", .0.len())]
    AccountsStale(Vec<AccountStaleDevices>),

    /// Missing or wrong credential.
    #[error("unauthorized")]
    Unauthorized,

    /// Non-story send addressed identifiers that do not exist.
    #[error("{} recipients not found", .0.len())]
    NotFound(Vec<ServiceIdentifier>),

    /// The worker pool could not run the batch.
    #[error("dispatch failed: {0}")]
    Pool(#[from] PoolError),
}

impl DispatchError {
    /// HTTP-style status code for this state.
    pub fn status(&self) -> u16 {
        match self {
            Self::Malformed(err) if err.is_size_limit() => 413,
            Self::Malformed(_) | Self::DuplicateDevice(_) => 422,
            Self::ConflictingCredentials
            | Self::InvalidContent { .. }
            | Self::ForbiddenEnvelopeType { .. } => 400,
            Self::ContentTooLarge { .. } => 413,
            Self::MismatchedDevices(_) | Self::AccountsMismatched(_) => 409,
            Self::StaleDevices(_) | Self::AccountsStale(_) => 410,
            Self::Unauthorized => 401,
            Self::NotFound(_) => 404,
            Self::Pool(_) => 500,
        }
    }

    /// Returns true if the request failed for reasons outside the client's
    /// control.
    ///
    /// Only batch-level pool failures are fatal; everything else is a
    /// validation result the client can act on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Pool(_))
    }
}

impl From<AccessError> for DispatchError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthorized => Self::Unauthorized,
            AccessError::NotFound(identifiers) => Self::NotFound(identifiers),
        }
    }
}

//! Sealpost wire formats.
//!
//! Everything a client puts on the wire, and everything the server answers
//! with, lives here:
//!
//! - [`varint`]: 7-bit little-endian group encoding used for device ids
//! - [`ServiceIdentifier`]: ACI / PNI tagged account addresses
//! - [`MultiRecipientMessage`]: the binary multi-recipient payload, with its
//!   size limits and duplicate guard
//! - [`IncomingMessageList`]: the JSON single-recipient request body
//! - [`Envelope`]: one encrypted unit handed to the delivery layer
//! - [`response`]: the JSON bodies returned for each terminal state
//!
//! This crate performs no I/O and holds no state. Decoding is zero-copy where
//! the payload allows it: the shared ciphertext of a multi-recipient message is
//! a slice of the request buffer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod errors;
pub mod identifier;
pub mod message;
pub mod multi_recipient;
pub mod response;
pub mod varint;

pub use envelope::{Envelope, EnvelopeSource, EnvelopeType};
pub use errors::{IdentifierError, VarintError, WireError};
pub use identifier::{IdentityType, ServiceIdentifier};
pub use message::{IncomingMessage, IncomingMessageList};
pub use multi_recipient::{
    DecodeLimits, IdentifierEncoding, KEY_MATERIAL_LEN, MAX_DEVICE_ID, MAX_RECORD_LEN,
    MIN_SHARED_PAYLOAD_LEN, MultiRecipientMessage, Recipient,
};
pub use response::{
    AccountMismatchedDevices, AccountStaleDevices, MismatchedDevices, SendMessageResponse,
    SendMultiRecipientMessageResponse, StaleDevices,
};

/// Device identifier. The primary device of every account is `1`.
pub type DeviceId = u64;

/// Per-device key-material epoch counter.
pub type RegistrationId = u16;

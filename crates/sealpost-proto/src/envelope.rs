//! Delivery envelopes.
//!
//! An [`Envelope`] is one encrypted unit bound for exactly one device. The
//! server stamps it with its own receive time and a GUID; the content is
//! opaque ciphertext.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use uuid::Uuid;

use crate::{DeviceId, ServiceIdentifier};

/// Kind of ciphertext an envelope carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum EnvelopeType {
    /// Whisper-style ciphertext for an established session
    Ciphertext = 1,
    /// Legacy key exchange
    KeyExchange = 2,
    /// Ciphertext that establishes a session from a pre-key bundle
    PrekeyBundle = 3,
    /// Receipt generated by the server itself; never accepted from clients
    ServerDeliveryReceipt = 5,
    /// Sealed-sender ciphertext
    UnidentifiedSender = 6,
    /// Unencrypted content (decryption error notices)
    PlaintextContent = 8,
}

impl EnvelopeType {
    /// Returns true if clients are allowed to submit this type.
    pub fn is_client_submittable(self) -> bool {
        !matches!(self, Self::ServerDeliveryReceipt)
    }
}

/// Authenticated origin of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeSource {
    /// Sender's account identifier
    pub aci: Uuid,
    /// Sending device
    pub device_id: DeviceId,
}

/// One encrypted message for one device.
///
/// # Security
///
/// The `Debug` impl prints only the content length.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Ciphertext kind
    #[serde(rename = "type")]
    pub envelope_type: EnvelopeType,
    /// Client-assigned timestamp (ms)
    pub timestamp: u64,
    /// Server receive time (ms)
    pub server_timestamp: u64,
    /// Sender, absent for sealed-sender deliveries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<EnvelopeSource>,
    /// Addressed identifier, in the form the client used
    pub destination: ServiceIdentifier,
    /// Opaque ciphertext
    #[serde(with = "base64_bytes")]
    pub content: Bytes,
    /// Whether the push should wake the device
    pub urgent: bool,
    /// Story broadcast
    pub story: bool,
    /// Server-assigned unique id
    pub server_guid: Uuid,
}

impl Envelope {
    /// Returns true if the sender is hidden from the server.
    pub fn is_sealed_sender(&self) -> bool {
        self.source.is_none()
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("envelope_type", &self.envelope_type)
            .field("timestamp", &self.timestamp)
            .field("server_timestamp", &self.server_timestamp)
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("content", &format_args!("<redacted {} bytes>", self.content.len()))
            .field("urgent", &self.urgent)
            .field("story", &self.story)
            .field("server_guid", &self.server_guid)
            .finish()
    }
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let raw = String::deserialize(deserializer)?;
        STANDARD.decode(raw).map(Bytes::from).map_err(serde::de::Error::custom)
    }
}

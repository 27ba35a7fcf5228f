//! Single-recipient request body.
//!
//! The client sends one [`IncomingMessage`] per destination device, each
//! carrying that device's ciphertext as base64.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::{DeviceId, RegistrationId, envelope::EnvelopeType};

/// Ciphertext for one destination device.
///
/// # Security
///
/// The `Debug` impl redacts `content`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    /// Ciphertext kind
    #[serde(rename = "type")]
    pub envelope_type: EnvelopeType,
    /// Addressed device
    pub destination_device_id: DeviceId,
    /// Registration id the client believes the device holds
    pub destination_registration_id: RegistrationId,
    /// Base64 ciphertext
    pub content: String,
}

impl IncomingMessage {
    /// Decode the base64 content.
    pub fn decoded_content(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.content)
    }
}

impl std::fmt::Debug for IncomingMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingMessage")
            .field("envelope_type", &self.envelope_type)
            .field("destination_device_id", &self.destination_device_id)
            .field("destination_registration_id", &self.destination_registration_id)
            .field("content", &format_args!("<redacted {} chars>", self.content.len()))
            .finish()
    }
}

/// Body of a single-recipient send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessageList {
    /// One entry per destination device
    pub messages: Vec<IncomingMessage>,
    /// Deliver only to currently connected devices
    #[serde(default)]
    pub online: bool,
    /// Whether the push should wake the device
    #[serde(default = "default_urgent")]
    pub urgent: bool,
    /// Client-assigned timestamp (ms)
    #[serde(default)]
    pub timestamp: u64,
}

fn default_urgent() -> bool {
    true
}

//! Status and JSON body of a finished send.
//!
//! Every terminal state maps to one status code and one body shape. Bodies
//! never carry key material or message content.

use sealpost_core::DispatchError;
use sealpost_proto::{
    IdentifierEncoding, MultiRecipientMessage, SendMessageResponse,
    SendMultiRecipientMessageResponse, ServiceIdentifier,
};
use serde::Serialize;
use serde_json::{Value, json};

/// Status code plus JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// HTTP-style status
    pub status: u16,
    /// Response body
    pub body: Value,
}

impl Report {
    /// Report for a multi-recipient send.
    pub fn multi(result: Result<SendMultiRecipientMessageResponse, DispatchError>) -> Self {
        match result {
            Ok(response) => Self::ok(&response),
            Err(err) => Self::error(&err),
        }
    }

    /// Report for a single-recipient send.
    pub fn single(result: Result<SendMessageResponse, DispatchError>) -> Self {
        match result {
            Ok(response) => Self::ok(&response),
            Err(err) => Self::error(&err),
        }
    }

    fn ok(response: &impl Serialize) -> Self {
        Self { status: 200, body: serde_json::to_value(response).unwrap_or(Value::Null) }
    }

    /// Report for a rejected or failed send.
    pub fn error(err: &DispatchError) -> Self {
        let body = match err {
            DispatchError::MismatchedDevices(devices) => serde_json::to_value(devices),
            DispatchError::StaleDevices(devices) => serde_json::to_value(devices),
            DispatchError::AccountsMismatched(accounts) => serde_json::to_value(accounts),
            DispatchError::AccountsStale(accounts) => serde_json::to_value(accounts),
            DispatchError::NotFound(identifiers) => serde_json::to_value(
                SendMultiRecipientMessageResponse { uuids404: identifiers.clone() },
            ),
            DispatchError::Pool(_) => Ok(json!({ "error": "internal error" })),
            other => Ok(json!({ "error": other.to_string() })),
        };

        Self { status: err.status(), body: body.unwrap_or(Value::Null) }
    }
}

/// Secret-free description of a decoded multi-recipient payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadSummary {
    /// Identifier encoding named by the version byte
    pub encoding: &'static str,
    /// Number of recipient records
    pub recipient_count: usize,
    /// Distinct identifiers and their addressed devices
    pub recipients: Vec<RecipientSummary>,
    /// Shared payload length
    pub shared_payload_len: usize,
}

/// Devices addressed for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientSummary {
    /// Identifier in text form
    pub identifier: ServiceIdentifier,
    /// `(device id, registration id)` pairs in wire order
    pub devices: Vec<(u64, u16)>,
}

impl PayloadSummary {
    /// Summarize a decoded payload.
    pub fn new(message: &MultiRecipientMessage) -> Self {
        let recipients = message
            .recipients_by_identifier()
            .into_iter()
            .map(|(identifier, records)| RecipientSummary {
                identifier,
                devices: records.iter().map(|r| (r.device_id, r.registration_id)).collect(),
            })
            .collect();

        Self {
            encoding: match message.encoding {
                IdentifierEncoding::Ambiguous => "ambiguous",
                IdentifierEncoding::Explicit => "explicit",
            },
            recipient_count: message.recipients.len(),
            recipients,
            shared_payload_len: message.shared_payload.len(),
        }
    }
}

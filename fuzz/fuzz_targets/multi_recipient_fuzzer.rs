//! Fuzz target for the multi-recipient payload decoder
//!
//! Prevent crashes and resource blowups on untrusted request bodies
//!
//! # Strategy
//!
//! - Raw bytes: the whole request body comes from the fuzzer
//! - Both identifier encodings are reachable through the version byte
//! - Tight limits on every other input so size checks are exercised
//!
//! # Invariants
//!
//! - NEVER panic on any input
//! - Accepted payloads have no (identifier, device) pair twice
//! - Accepted payloads survive re-encoding unchanged, and the canonical form
//!   is never longer than the input
//! - Per-device content is key material followed by the shared payload

#![no_main]

use std::collections::HashSet;

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use sealpost_proto::{DecodeLimits, KEY_MATERIAL_LEN, MultiRecipientMessage};

fuzz_target!(|data: &[u8]| {
    let limits = if data.first().is_some_and(|b| b & 1 == 1) {
        DecodeLimits { max_recipients: 8, max_content_bytes: 64 }
    } else {
        DecodeLimits::default()
    };

    let Ok(message) = MultiRecipientMessage::decode(Bytes::copy_from_slice(data), &limits) else {
        return;
    };

    assert!(message.recipients.len() <= limits.max_recipients);
    assert!(message.shared_payload.len() <= limits.max_content_bytes);

    let mut seen = HashSet::new();
    for recipient in &message.recipients {
        assert!(seen.insert((recipient.identifier, recipient.device_id)), "duplicate accepted");

        let content = message.content_for(recipient);
        assert_eq!(content.len(), KEY_MATERIAL_LEN + message.shared_payload.len());
        assert_eq!(&content[..KEY_MATERIAL_LEN], &recipient.key_material[..]);
    }

    let encoded = message.to_bytes().expect("decoded message must re-encode");
    assert!(encoded.len() <= data.len());

    let decoded = MultiRecipientMessage::decode(encoded, &limits).expect("canonical form must decode");
    assert_eq!(decoded, message, "re-encoding changed the payload");
});

//! Multi-recipient payload codec.
//!
//! One request addresses many devices of many accounts and carries a single
//! shared ciphertext. Each device gets its own 48 bytes of key material.
//!
//! ```text
//! u8       version            0x22 ambiguous ids | 0x23 explicit ids
//! u8       recipient count    0..=255
//! count × {
//!   identifier      16 bytes (ambiguous) | 1 type byte + 16 bytes (explicit)
//!   device id       varint, 1..=9 bytes
//!   registration id u16, big-endian
//!   key material    48 bytes
//! }
//! shared payload    remaining bytes, at least 32
//! ```
//!
//! # Security
//!
//! The decoder rejects a repeated (identifier, device id) pair. Every distinct
//! pair costs the server an account lookup and a per-device queue operation
//! downstream, so without the guard a single request could replay the same
//! expensive operation hundreds of times. The check is a single pass over a
//! hash set and runs before the payload is handed to anything that touches
//! storage.

use std::collections::{BTreeMap, HashSet};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    DeviceId, RegistrationId,
    errors::{VarintError, WireError},
    identifier::{IdentityType, ServiceIdentifier},
    varint,
};

/// Size of the per-recipient key material.
pub const KEY_MATERIAL_LEN: usize = 48;

/// Smallest acceptable shared payload.
pub const MIN_SHARED_PAYLOAD_LEN: usize = 32;

/// Largest device id a record may carry.
pub const MAX_DEVICE_ID: DeviceId = (1 << 62) - 1;

/// Largest encoded record: explicit identifier, 9-byte varint.
pub const MAX_RECORD_LEN: usize = ServiceIdentifier::FIXED_WIDTH_LEN + 9 + 2 + KEY_MATERIAL_LEN;

/// Version byte plus count byte.
const HEADER_LEN: usize = 2;

/// Most recipients the one-byte count can express.
const WIRE_MAX_RECIPIENTS: usize = u8::MAX as usize;

/// How recipient identifiers are encoded, selected by the version byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IdentifierEncoding {
    /// Bare 16-byte UUIDs, read as ACIs.
    Ambiguous = 0x22,
    /// Type byte + UUID, distinguishing ACI from PNI.
    Explicit = 0x23,
}

impl IdentifierEncoding {
    /// Parse a version byte.
    pub fn from_version(byte: u8) -> Option<Self> {
        match byte {
            0x22 => Some(Self::Ambiguous),
            0x23 => Some(Self::Explicit),
            _ => None,
        }
    }

    /// Encoded identifier width in this mode.
    pub fn identifier_len(self) -> usize {
        match self {
            Self::Ambiguous => ServiceIdentifier::UUID_LEN,
            Self::Explicit => ServiceIdentifier::FIXED_WIDTH_LEN,
        }
    }
}

/// One addressing record of a multi-recipient payload.
///
/// # Security
///
/// The `Debug` impl redacts `key_material`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Recipient {
    /// Addressed account
    pub identifier: ServiceIdentifier,
    /// Addressed device
    pub device_id: DeviceId,
    /// Registration id the client believes the device holds
    pub registration_id: RegistrationId,
    /// Per-device key material, prepended to the shared payload on delivery
    pub key_material: [u8; KEY_MATERIAL_LEN],
}

impl std::fmt::Debug for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recipient")
            .field("identifier", &self.identifier)
            .field("device_id", &self.device_id)
            .field("registration_id", &self.registration_id)
            .field("key_material", &format_args!("<redacted {KEY_MATERIAL_LEN} bytes>"))
            .finish()
    }
}

/// Size limits applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum recipient count (at most 255)
    pub max_recipients: usize,
    /// Maximum shared payload length
    pub max_content_bytes: usize,
}

impl DecodeLimits {
    /// Largest body a payload within these limits can occupy.
    pub fn max_request_bytes(&self) -> usize {
        HEADER_LEN
            + self.max_recipients.min(WIRE_MAX_RECIPIENTS) * MAX_RECORD_LEN
            + self.max_content_bytes
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self { max_recipients: WIRE_MAX_RECIPIENTS, max_content_bytes: 256 * 1024 }
    }
}

/// A decoded multi-recipient payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiRecipientMessage {
    /// Identifier encoding the payload used
    pub encoding: IdentifierEncoding,
    /// Records in wire order
    pub recipients: Vec<Recipient>,
    /// Ciphertext shared by every recipient
    pub shared_payload: Bytes,
}

impl MultiRecipientMessage {
    /// Decode and validate a payload.
    ///
    /// The shared payload is a zero-copy slice of `body`. Checks run in wire
    /// order: overall size, version, count, each record, shared payload
    /// bounds, and finally the duplicate guard.
    pub fn decode(body: Bytes, limits: &DecodeLimits) -> Result<Self, WireError> {
        let max_request = limits.max_request_bytes();
        if body.len() > max_request {
            return Err(WireError::RequestTooLarge { len: body.len(), max: max_request });
        }

        let mut buf = body;
        if buf.remaining() < HEADER_LEN {
            if let Some(&version) = buf.first() {
                IdentifierEncoding::from_version(version)
                    .ok_or(WireError::UnsupportedVersion(version))?;
            }
            return Err(WireError::Truncated { index: 0, count: 0 });
        }

        let version = buf.get_u8();
        let encoding =
            IdentifierEncoding::from_version(version).ok_or(WireError::UnsupportedVersion(version))?;

        let count = usize::from(buf.get_u8());
        let max_recipients = limits.max_recipients.min(WIRE_MAX_RECIPIENTS);
        if count > max_recipients {
            return Err(WireError::TooManyRecipients { count, max: max_recipients });
        }

        let mut recipients = Vec::with_capacity(count);
        for index in 0..count {
            recipients.push(read_recipient(&mut buf, encoding, index, count)?);
        }

        let len = buf.remaining();
        if len < MIN_SHARED_PAYLOAD_LEN {
            return Err(WireError::PayloadTooSmall { len, min: MIN_SHARED_PAYLOAD_LEN });
        }
        if len > limits.max_content_bytes {
            return Err(WireError::ContentTooLarge { len, max: limits.max_content_bytes });
        }

        reject_duplicates(&recipients)?;

        Ok(Self { encoding, recipients, shared_payload: buf })
    }

    /// Append the wire form to `buf`.
    ///
    /// Fails if there are more recipients than the count byte can express.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), WireError> {
        let count = u8::try_from(self.recipients.len()).map_err(|_| {
            WireError::TooManyRecipients { count: self.recipients.len(), max: WIRE_MAX_RECIPIENTS }
        })?;

        buf.put_u8(self.encoding as u8);
        buf.put_u8(count);

        for recipient in &self.recipients {
            match self.encoding {
                IdentifierEncoding::Explicit => {
                    buf.put_slice(&recipient.identifier.to_fixed_width_bytes());
                },
                IdentifierEncoding::Ambiguous => {
                    buf.put_slice(recipient.identifier.uuid().as_bytes());
                },
            }
            varint::encode(recipient.device_id, buf);
            buf.put_u16(recipient.registration_id);
            buf.put_slice(&recipient.key_material);
        }

        buf.put_slice(&self.shared_payload);
        Ok(())
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes, WireError> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Length of the canonical encoding.
    pub fn encoded_len(&self) -> usize {
        let records: usize = self
            .recipients
            .iter()
            .map(|r| {
                self.encoding.identifier_len() + varint::encoded_len(r.device_id) + 2 + KEY_MATERIAL_LEN
            })
            .sum();

        HEADER_LEN + records + self.shared_payload.len()
    }

    /// Records grouped by identifier, ordered by identifier.
    ///
    /// Within a group, records keep their wire order. Each key is one distinct
    /// account address and costs one lookup downstream.
    pub fn recipients_by_identifier(&self) -> BTreeMap<ServiceIdentifier, Vec<&Recipient>> {
        let mut groups: BTreeMap<ServiceIdentifier, Vec<&Recipient>> = BTreeMap::new();
        for recipient in &self.recipients {
            groups.entry(recipient.identifier).or_default().push(recipient);
        }
        groups
    }

    /// Delivery content for one recipient: its key material followed by the
    /// shared payload.
    pub fn content_for(&self, recipient: &Recipient) -> Bytes {
        let mut content = BytesMut::with_capacity(KEY_MATERIAL_LEN + self.shared_payload.len());
        content.put_slice(&recipient.key_material);
        content.put_slice(&self.shared_payload);
        content.freeze()
    }
}

fn read_recipient(
    buf: &mut Bytes,
    encoding: IdentifierEncoding,
    index: usize,
    count: usize,
) -> Result<Recipient, WireError> {
    let truncated = WireError::Truncated { index, count };

    if buf.remaining() < encoding.identifier_len() {
        return Err(truncated);
    }
    let identifier = match encoding {
        IdentifierEncoding::Explicit => {
            let tag = buf.get_u8();
            let identity_type =
                IdentityType::from_u8(tag).ok_or(WireError::InvalidIdentifierType(tag))?;
            ServiceIdentifier::from_parts(identity_type, read_uuid(buf))
        },
        IdentifierEncoding::Ambiguous => ServiceIdentifier::Aci(read_uuid(buf)),
    };

    let before = buf.remaining();
    let device_id = varint::decode(buf).map_err(|e| match e {
        VarintError::Truncated { .. } => truncated.clone(),
        VarintError::Overflow | VarintError::NonCanonical { .. } => WireError::Varint(e),
    })?;

    // Padded encodings would let a record outgrow `MAX_RECORD_LEN`.
    let (len, canonical) = (before - buf.remaining(), varint::encoded_len(device_id));
    if len > canonical {
        return Err(WireError::Varint(VarintError::NonCanonical { len, canonical }));
    }
    if device_id == 0 || device_id > MAX_DEVICE_ID {
        return Err(WireError::InvalidDeviceId(device_id));
    }

    if buf.remaining() < 2 + KEY_MATERIAL_LEN {
        return Err(truncated);
    }
    let registration_id = buf.get_u16();
    let mut key_material = [0u8; KEY_MATERIAL_LEN];
    buf.copy_to_slice(&mut key_material);

    Ok(Recipient { identifier, device_id, registration_id, key_material })
}

fn read_uuid(buf: &mut Bytes) -> uuid::Uuid {
    let mut bytes = [0u8; ServiceIdentifier::UUID_LEN];
    buf.copy_to_slice(&mut bytes);
    uuid::Uuid::from_bytes(bytes)
}

fn reject_duplicates(recipients: &[Recipient]) -> Result<(), WireError> {
    let mut seen = HashSet::with_capacity(recipients.len());
    for recipient in recipients {
        if !seen.insert((recipient.identifier, recipient.device_id)) {
            return Err(WireError::DuplicateRecipient {
                identifier: recipient.identifier,
                device_id: recipient.device_id,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use proptest::{collection::vec, prelude::*};
    use uuid::Uuid;

    use super::*;

    const ACCOUNT: Uuid = Uuid::from_u128(0x2222_2222_2222_2222_2222_2222_2222_2222);

    fn recipient(identifier: ServiceIdentifier, device_id: DeviceId, registration_id: u16) -> Recipient {
        Recipient { identifier, device_id, registration_id, key_material: [0xab; KEY_MATERIAL_LEN] }
    }

    fn message(encoding: IdentifierEncoding, recipients: Vec<Recipient>) -> MultiRecipientMessage {
        MultiRecipientMessage { encoding, recipients, shared_payload: Bytes::from(vec![7u8; 39]) }
    }

    fn encode(message: &MultiRecipientMessage) -> Bytes {
        message.to_bytes().expect("encode")
    }

    fn decode(body: Bytes) -> Result<MultiRecipientMessage, WireError> {
        MultiRecipientMessage::decode(body, &DecodeLimits::default())
    }

    #[test]
    fn explicit_layout_is_bit_exact() {
        let msg = message(
            IdentifierEncoding::Explicit,
            vec![recipient(ServiceIdentifier::Pni(ACCOUNT), 300, 0x0102)],
        );
        let bytes = encode(&msg);

        assert_eq!(bytes[0], 0x23);
        assert_eq!(bytes[1], 1);
        assert_eq!(bytes[2], 0x01, "PNI type byte");
        assert_eq!(&bytes[3..19], ACCOUNT.as_bytes());
        assert_eq!(&bytes[19..21], &[0xac, 0x02], "varint device id");
        assert_eq!(&bytes[21..23], &[0x01, 0x02], "big-endian registration id");
        assert_eq!(&bytes[23..71], &[0xab; KEY_MATERIAL_LEN]);
        assert_eq!(&bytes[71..], &[7u8; 39]);
        assert_eq!(bytes.len(), msg.encoded_len());
    }

    #[test]
    fn ambiguous_identifiers_decode_as_aci() {
        let msg = message(
            IdentifierEncoding::Ambiguous,
            vec![recipient(ServiceIdentifier::Aci(ACCOUNT), 1, 222)],
        );
        let bytes = encode(&msg);
        assert_eq!(&bytes[2..18], ACCOUNT.as_bytes());

        let decoded = decode(bytes).expect("decode");
        assert_eq!(decoded.recipients[0].identifier, ServiceIdentifier::Aci(ACCOUNT));
        assert_eq!(decoded, msg);
    }

    #[test]
    fn shared_payload_is_remainder() {
        let msg = message(IdentifierEncoding::Explicit, vec![]);
        let decoded = decode(encode(&msg)).expect("decode");
        assert!(decoded.recipients.is_empty());
        assert_eq!(decoded.shared_payload, Bytes::from(vec![7u8; 39]));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = encode(&message(IdentifierEncoding::Explicit, vec![])).to_vec();
        bytes[0] = 0x21;
        assert_eq!(decode(bytes.into()), Err(WireError::UnsupportedVersion(0x21)));
    }

    #[test]
    fn rejects_empty_body() {
        assert_eq!(decode(Bytes::new()), Err(WireError::Truncated { index: 0, count: 0 }));
    }

    #[test]
    fn rejects_truncated_records() {
        let msg = message(
            IdentifierEncoding::Explicit,
            vec![
                recipient(ServiceIdentifier::Aci(ACCOUNT), 1, 1),
                recipient(ServiceIdentifier::Aci(ACCOUNT), 2, 1),
            ],
        );
        let mut bytes = encode(&msg).to_vec();
        // Claim a third record that is not there; the old payload becomes a
        // partial record.
        bytes[1] = 3;
        bytes.truncate(bytes.len() - 30);

        assert_eq!(decode(bytes.into()), Err(WireError::Truncated { index: 2, count: 3 }));
    }

    #[test]
    fn rejects_small_shared_payload() {
        let mut msg = message(IdentifierEncoding::Ambiguous, vec![]);
        msg.shared_payload = Bytes::from(vec![0u8; 31]);
        assert_eq!(decode(encode(&msg)), Err(WireError::PayloadTooSmall { len: 31, min: 32 }));

        msg.shared_payload = Bytes::from(vec![0u8; 32]);
        assert!(decode(encode(&msg)).is_ok());
    }

    #[test]
    fn rejects_unknown_identifier_type() {
        let msg = message(
            IdentifierEncoding::Explicit,
            vec![recipient(ServiceIdentifier::Aci(ACCOUNT), 1, 1)],
        );
        let mut bytes = encode(&msg).to_vec();
        bytes[2] = 0x05;
        assert_eq!(decode(bytes.into()), Err(WireError::InvalidIdentifierType(0x05)));
    }

    #[test]
    fn rejects_device_id_zero() {
        let msg = message(
            IdentifierEncoding::Explicit,
            vec![recipient(ServiceIdentifier::Aci(ACCOUNT), 0, 1)],
        );
        assert_eq!(decode(encode(&msg)), Err(WireError::InvalidDeviceId(0)));
    }

    #[test]
    fn rejects_device_id_above_range() {
        let msg = message(
            IdentifierEncoding::Explicit,
            vec![recipient(ServiceIdentifier::Aci(ACCOUNT), MAX_DEVICE_ID + 1, 1)],
        );
        assert_eq!(decode(encode(&msg)), Err(WireError::InvalidDeviceId(MAX_DEVICE_ID + 1)));
    }

    #[test]
    fn rejects_padded_device_id() {
        // Device id 1 padded to ten bytes.
        let mut bytes = vec![0x23, 1, 0x00];
        bytes.extend_from_slice(ACCOUNT.as_bytes());
        bytes.extend_from_slice(&hex!("81808080808080808000"));
        bytes.extend_from_slice(&[0x00, 0x01]);
        bytes.extend_from_slice(&[0xab; KEY_MATERIAL_LEN]);
        bytes.extend_from_slice(&[7u8; 39]);

        assert_eq!(
            decode(bytes.into()),
            Err(WireError::Varint(VarintError::NonCanonical { len: 10, canonical: 1 }))
        );
    }

    #[test]
    fn largest_device_id_fits_record_ceiling() {
        let msg = message(
            IdentifierEncoding::Explicit,
            vec![recipient(ServiceIdentifier::Aci(ACCOUNT), MAX_DEVICE_ID, 1)],
        );
        let body = encode(&msg);

        assert_eq!(body.len(), HEADER_LEN + MAX_RECORD_LEN + 39);
        assert_eq!(decode(body).map(|m| m.recipients[0].device_id), Ok(MAX_DEVICE_ID));
    }

    #[test]
    fn duplicate_pair_is_rejected_even_if_other_fields_differ() {
        for encoding in [IdentifierEncoding::Explicit, IdentifierEncoding::Ambiguous] {
            let mut again = recipient(ServiceIdentifier::Aci(ACCOUNT), 1, 999);
            again.key_material = [0x11; KEY_MATERIAL_LEN];

            let msg = message(
                encoding,
                vec![
                    recipient(ServiceIdentifier::Aci(ACCOUNT), 1, 222),
                    recipient(ServiceIdentifier::Aci(ACCOUNT), 2, 222),
                    again,
                ],
            );

            assert_eq!(
                decode(encode(&msg)),
                Err(WireError::DuplicateRecipient {
                    identifier: ServiceIdentifier::Aci(ACCOUNT),
                    device_id: 1,
                })
            );
        }
    }

    #[test]
    fn same_device_under_aci_and_pni_is_not_a_duplicate() {
        let msg = message(
            IdentifierEncoding::Explicit,
            vec![
                recipient(ServiceIdentifier::Aci(ACCOUNT), 1, 1),
                recipient(ServiceIdentifier::Pni(ACCOUNT), 1, 1),
            ],
        );
        assert!(decode(encode(&msg)).is_ok());
    }

    #[test]
    fn enforces_recipient_limit_before_reading_records() {
        let limits = DecodeLimits { max_recipients: 1, ..DecodeLimits::default() };
        let msg = message(
            IdentifierEncoding::Explicit,
            vec![
                recipient(ServiceIdentifier::Aci(ACCOUNT), 1, 1),
                recipient(ServiceIdentifier::Aci(ACCOUNT), 2, 1),
            ],
        );

        assert_eq!(
            MultiRecipientMessage::decode(encode(&msg), &limits),
            Err(WireError::TooManyRecipients { count: 2, max: 1 })
        );
    }

    #[test]
    fn enforces_request_and_content_ceilings() {
        let limits = DecodeLimits { max_recipients: 1, max_content_bytes: 64 };
        assert_eq!(limits.max_request_bytes(), 2 + 76 + 64);

        let body = Bytes::from(vec![0x23; limits.max_request_bytes() + 1]);
        assert_eq!(
            MultiRecipientMessage::decode(body, &limits),
            Err(WireError::RequestTooLarge { len: 143, max: 142 })
        );

        let mut msg = message(IdentifierEncoding::Explicit, vec![]);
        msg.shared_payload = Bytes::from(vec![0u8; 65]);
        assert_eq!(
            MultiRecipientMessage::decode(encode(&msg), &limits),
            Err(WireError::ContentTooLarge { len: 65, max: 64 })
        );
    }

    #[test]
    fn groups_by_identifier() {
        let msg = message(
            IdentifierEncoding::Explicit,
            vec![
                recipient(ServiceIdentifier::Pni(ACCOUNT), 1, 1),
                recipient(ServiceIdentifier::Aci(ACCOUNT), 2, 1),
                recipient(ServiceIdentifier::Aci(ACCOUNT), 1, 1),
            ],
        );

        let groups = msg.recipients_by_identifier();
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec![ServiceIdentifier::Aci(ACCOUNT), ServiceIdentifier::Pni(ACCOUNT)]);

        let aci_devices: Vec<_> =
            groups[&ServiceIdentifier::Aci(ACCOUNT)].iter().map(|r| r.device_id).collect();
        assert_eq!(aci_devices, vec![2, 1]);
    }

    #[test]
    fn content_prepends_key_material() {
        let msg = message(
            IdentifierEncoding::Explicit,
            vec![recipient(ServiceIdentifier::Aci(ACCOUNT), 1, 1)],
        );
        let content = msg.content_for(&msg.recipients[0]);
        assert_eq!(&content[..KEY_MATERIAL_LEN], &[0xab; KEY_MATERIAL_LEN]);
        assert_eq!(&content[KEY_MATERIAL_LEN..], &msg.shared_payload[..]);
    }

    #[test]
    fn debug_redacts_key_material() {
        let debug = format!("{:?}", recipient(ServiceIdentifier::Aci(ACCOUNT), 1, 1));
        assert!(debug.contains("<redacted 48 bytes>"));
        assert!(!debug.contains("171"), "raw key bytes leaked: {debug}");
    }

    fn arb_identifier(explicit: bool) -> impl Strategy<Value = ServiceIdentifier> {
        (any::<u128>(), any::<bool>()).prop_map(move |(uuid, pni)| {
            let uuid = Uuid::from_u128(uuid);
            if explicit && pni { ServiceIdentifier::Pni(uuid) } else { ServiceIdentifier::Aci(uuid) }
        })
    }

    fn arb_recipient(explicit: bool) -> impl Strategy<Value = Recipient> {
        (arb_identifier(explicit), 1..=MAX_DEVICE_ID, any::<u16>(), vec(any::<u8>(), KEY_MATERIAL_LEN))
            .prop_map(|(identifier, device_id, registration_id, key)| {
                let mut key_material = [0u8; KEY_MATERIAL_LEN];
                key_material.copy_from_slice(&key);
                Recipient { identifier, device_id, registration_id, key_material }
            })
    }

    fn round_trips(explicit: bool, recipients: Vec<Recipient>, payload: Vec<u8>) -> Result<(), TestCaseError> {
        let encoding =
            if explicit { IdentifierEncoding::Explicit } else { IdentifierEncoding::Ambiguous };
        let msg = MultiRecipientMessage { encoding, recipients, shared_payload: payload.into() };

        let decoded = decode(encode(&msg));
        prop_assert_eq!(decoded, Ok(msg));
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn round_trip_sizes(
            explicit in any::<bool>(),
            size in prop::sample::select(vec![0usize, 1, 100]),
            seed in vec(arb_recipient(true), 100),
            payload in vec(any::<u8>(), 32..256),
        ) {
            // Random UUIDs make repeated (identifier, device) pairs vanishingly
            // unlikely; ambiguous mode cannot express PNIs.
            let recipients = seed
                .into_iter()
                .take(size)
                .map(|mut r| {
                    if !explicit {
                        r.identifier = ServiceIdentifier::Aci(r.identifier.uuid());
                    }
                    r
                })
                .collect();
            round_trips(explicit, recipients, payload)?;
        }

        #[test]
        fn ambiguous_round_trip(recipients in vec(arb_recipient(false), 0..8)) {
            round_trips(false, recipients, vec![1u8; 32])?;
        }

        #[test]
        fn decode_never_panics(body in vec(any::<u8>(), 0..512)) {
            let _ = decode(Bytes::from(body));
        }
    }
}

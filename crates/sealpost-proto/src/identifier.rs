//! Service identifiers.
//!
//! An account is reachable under two namespaces: its account identifier (ACI)
//! and its phone-number identifier (PNI). Both wrap a UUID. The namespace is
//! part of the identity: responses echo back exactly the form the client used.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::errors::IdentifierError;

/// Namespace of a [`ServiceIdentifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum IdentityType {
    /// Account identifier
    Aci = 0x00,
    /// Phone-number identifier
    Pni = 0x01,
}

impl IdentityType {
    /// Parse the fixed-width type byte.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Aci),
            0x01 => Some(Self::Pni),
            _ => None,
        }
    }

    /// Prefix used by the text form. ACIs have none.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Aci => "",
            Self::Pni => "PNI:",
        }
    }
}

/// Typed account address.
///
/// Ordering is by namespace (ACI first), then UUID.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceIdentifier {
    /// Account identifier
    Aci(Uuid),
    /// Phone-number identifier
    Pni(Uuid),
}

impl ServiceIdentifier {
    /// Size of the tagged binary form: type byte + UUID.
    pub const FIXED_WIDTH_LEN: usize = 17;

    /// Size of the untagged binary form.
    pub const UUID_LEN: usize = 16;

    /// Namespace of this identifier.
    pub fn identity_type(&self) -> IdentityType {
        match self {
            Self::Aci(_) => IdentityType::Aci,
            Self::Pni(_) => IdentityType::Pni,
        }
    }

    /// The wrapped UUID.
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::Aci(uuid) | Self::Pni(uuid) => *uuid,
        }
    }

    /// Tagged binary form (type byte followed by the UUID bytes).
    pub fn to_fixed_width_bytes(&self) -> [u8; Self::FIXED_WIDTH_LEN] {
        let mut out = [0u8; Self::FIXED_WIDTH_LEN];
        out[0] = self.identity_type() as u8;
        out[1..].copy_from_slice(self.uuid().as_bytes());
        out
    }

    /// Parse the tagged binary form.
    pub fn from_fixed_width_bytes(bytes: &[u8]) -> Result<Self, IdentifierError> {
        if bytes.len() != Self::FIXED_WIDTH_LEN {
            return Err(IdentifierError::InvalidLength(bytes.len()));
        }

        let identity_type =
            IdentityType::from_u8(bytes[0]).ok_or(IdentifierError::UnknownType(bytes[0]))?;
        let mut uuid = [0u8; Self::UUID_LEN];
        uuid.copy_from_slice(&bytes[1..]);

        Ok(Self::from_parts(identity_type, Uuid::from_bytes(uuid)))
    }

    /// Build an identifier from its namespace and UUID.
    pub fn from_parts(identity_type: IdentityType, uuid: Uuid) -> Self {
        match identity_type {
            IdentityType::Aci => Self::Aci(uuid),
            IdentityType::Pni => Self::Pni(uuid),
        }
    }
}

impl fmt::Display for ServiceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.identity_type().prefix(), self.uuid().hyphenated())
    }
}

impl fmt::Debug for ServiceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aci(uuid) => write!(f, "Aci({uuid})"),
            Self::Pni(uuid) => write!(f, "Pni({uuid})"),
        }
    }
}

impl FromStr for ServiceIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (identity_type, raw) = match s.strip_prefix(IdentityType::Pni.prefix()) {
            Some(rest) => (IdentityType::Pni, rest),
            None => (IdentityType::Aci, s),
        };

        let uuid = Uuid::parse_str(raw)
            .map_err(|_| IdentifierError::InvalidUuid { input: s.to_string() })?;

        Ok(Self::from_parts(identity_type, uuid))
    }
}

impl Serialize for ServiceIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ServiceIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: Uuid = Uuid::from_u128(0x2222_2222_2222_2222_2222_2222_2222_2222);

    #[test]
    fn text_form_carries_namespace() {
        assert_eq!(ServiceIdentifier::Aci(UUID).to_string(), "22222222-2222-2222-2222-222222222222");
        assert_eq!(
            ServiceIdentifier::Pni(UUID).to_string(),
            "PNI:22222222-2222-2222-2222-222222222222"
        );
    }

    #[test]
    fn text_form_parses_back() {
        for id in [ServiceIdentifier::Aci(UUID), ServiceIdentifier::Pni(UUID)] {
            assert_eq!(id.to_string().parse::<ServiceIdentifier>(), Ok(id));
        }
    }

    #[test]
    fn text_form_rejects_garbage() {
        assert!(matches!(
            "PNI:not-a-uuid".parse::<ServiceIdentifier>(),
            Err(IdentifierError::InvalidUuid { .. })
        ));
    }

    #[test]
    fn fixed_width_layout() {
        let bytes = ServiceIdentifier::Pni(UUID).to_fixed_width_bytes();
        assert_eq!(bytes[0], 0x01);
        assert_eq!(&bytes[1..], UUID.as_bytes());
        assert_eq!(ServiceIdentifier::from_fixed_width_bytes(&bytes), Ok(ServiceIdentifier::Pni(UUID)));
    }

    #[test]
    fn fixed_width_rejects_unknown_type() {
        let mut bytes = ServiceIdentifier::Aci(UUID).to_fixed_width_bytes();
        bytes[0] = 0x07;
        assert_eq!(
            ServiceIdentifier::from_fixed_width_bytes(&bytes),
            Err(IdentifierError::UnknownType(0x07))
        );
    }

    #[test]
    fn aci_and_pni_with_same_uuid_are_distinct() {
        assert_ne!(ServiceIdentifier::Aci(UUID), ServiceIdentifier::Pni(UUID));
        assert!(ServiceIdentifier::Aci(UUID) < ServiceIdentifier::Pni(UUID));
    }

    #[test]
    fn serde_uses_text_form() {
        let json = serde_json::to_string(&ServiceIdentifier::Pni(UUID)).expect("encode");
        assert_eq!(json, "\"PNI:22222222-2222-2222-2222-222222222222\"");

        let decoded: ServiceIdentifier = serde_json::from_str(&json).expect("decode");
        assert_eq!(decoded, ServiceIdentifier::Pni(UUID));
    }
}

//! Wire-level error types.

use thiserror::Error;

use crate::{DeviceId, ServiceIdentifier};

/// Errors from the varint codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VarintError {
    /// Input ended before a byte with the continuation bit clear.
    #[error("varint truncated after {read} bytes")]
    Truncated {
        /// Bytes consumed before the input ran out
        read: usize,
    },

    /// Encoded value does not fit in 64 bits.
    #[error("varint overflows 64 bits")]
    Overflow,

    /// Encoding is longer than the shortest form of its value.
    #[error("non-canonical varint: {len} bytes for a {canonical}-byte value")]
    NonCanonical {
        /// Bytes consumed
        len: usize,
        /// Length of the shortest encoding
        canonical: usize,
    },
}

/// Errors from parsing the textual form of a service identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The UUID part is not a valid UUID.
    #[error("invalid service identifier {input:?}")]
    InvalidUuid {
        /// Offending input
        input: String,
    },

    /// Fixed-width form carried an unknown type byte.
    #[error("unknown identity type byte 0x{0:02x}")]
    UnknownType(u8),

    /// Fixed-width form had the wrong length.
    #[error("fixed-width identifier must be 17 bytes, got {0}")]
    InvalidLength(usize),
}

/// Errors from decoding a multi-recipient payload.
///
/// Every variant is detected before any account is looked up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Version byte is neither of the two known identifiers.
    #[error("unsupported version byte 0x{0:02x}")]
    UnsupportedVersion(u8),

    /// Buffer ended inside the header or a recipient record.
    #[error("payload truncated in recipient {index} of {count}")]
    Truncated {
        /// Zero-based index of the record being read
        index: usize,
        /// Declared recipient count
        count: usize,
    },

    /// Fewer than the minimum bytes left for the shared payload.
    #[error("shared payload too small: {len} bytes (minimum {min})")]
    PayloadTooSmall {
        /// Bytes remaining after the records
        len: usize,
        /// Required minimum
        min: usize,
    },

    /// Same (identifier, device) pair appears twice.
    #[error("duplicate recipient {identifier} device {device_id}")]
    DuplicateRecipient {
        /// Repeated identifier
        identifier: ServiceIdentifier,
        /// Repeated device id
        device_id: DeviceId,
    },

    /// Device id outside `1..=MAX_DEVICE_ID`.
    #[error("invalid device id {0}")]
    InvalidDeviceId(u64),

    /// Explicit identifier carried an unknown type byte.
    #[error("invalid identifier type 0x{0:02x}")]
    InvalidIdentifierType(u8),

    /// Declared recipient count exceeds the configured maximum.
    #[error("too many recipients: {count} (maximum {max})")]
    TooManyRecipients {
        /// Declared count
        count: usize,
        /// Configured maximum
        max: usize,
    },

    /// Request body exceeds the largest well-formed payload.
    #[error("request too large: {len} bytes (maximum {max})")]
    RequestTooLarge {
        /// Body length
        len: usize,
        /// Largest acceptable body
        max: usize,
    },

    /// Shared payload exceeds the message content ceiling.
    #[error("content too large: {len} bytes (maximum {max})")]
    ContentTooLarge {
        /// Shared payload length
        len: usize,
        /// Content ceiling
        max: usize,
    },

    /// Device id varint was malformed.
    #[error("malformed device id: {0}")]
    Varint(#[from] VarintError),
}

impl WireError {
    /// Returns true if this error is a size-limit violation rather than a
    /// malformed payload.
    ///
    /// Size violations map to 413, everything else to 422.
    pub fn is_size_limit(&self) -> bool {
        matches!(
            self,
            Self::TooManyRecipients { .. } | Self::RequestTooLarge { .. } | Self::ContentTooLarge { .. }
        )
    }
}

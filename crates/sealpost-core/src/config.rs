//! Dispatch limits.

use sealpost_proto::DecodeLimits;
use serde::{Deserialize, Serialize};

/// Size limits enforced before any delivery work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Ceiling for the multi-recipient shared payload and for each
    /// single-recipient message body.
    pub max_content_bytes: usize,

    /// Maximum recipient records in one multi-recipient payload. The wire
    /// format cannot express more than 255.
    pub max_recipients: usize,
}

impl DispatchConfig {
    /// Limits handed to the multi-recipient decoder.
    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits { max_recipients: self.max_recipients, max_content_bytes: self.max_content_bytes }
    }

    /// Largest acceptable multi-recipient request body.
    pub fn max_request_bytes(&self) -> usize {
        self.decode_limits().max_request_bytes()
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { max_content_bytes: 256 * 1024, max_recipients: 255 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_request_ceiling() {
        let config = DispatchConfig::default();
        assert_eq!(config.max_request_bytes(), 2 + 255 * 76 + 256 * 1024);
    }
}

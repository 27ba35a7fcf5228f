//! Server error types.

use sealpost_core::DispatchError;
use sealpost_proto::WireError;
use thiserror::Error;

/// Errors that can occur in the server runtime and CLI.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration file could not be parsed
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Reading a file failed
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing a JSON report failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A fixture value was syntactically valid TOML but semantically wrong
    #[error("invalid fixture: {0}")]
    Fixture(String),

    /// A payload failed to decode
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// The dispatch engine rejected a request
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

impl ServerError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Fixture(_) => 2,
            Self::Io(_) | Self::Json(_) => 3,
            Self::Wire(_) | Self::Dispatch(_) => 1,
        }
    }
}

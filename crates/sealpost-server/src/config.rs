//! Server configuration and account fixtures.
//!
//! Both are TOML. Every configuration field has a default, so an empty file
//! is a valid configuration.
//!
//! ```toml
//! log_level = "debug"
//!
//! [dispatch]
//! max_content_bytes = 262144
//! max_recipients = 255
//!
//! [pool]
//! max_concurrency = 16
//! max_pending = 10000
//! ```

use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use sealpost_core::{AccessKey, Account, Device, DispatchConfig};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MemoryAccountDirectory, ServerError, pool::PoolConfig};

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Request limits
    pub dispatch: DispatchConfig,
    /// Worker pool limits
    pub pool: PoolConfig,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            pool: PoolConfig::default(),
            log_level: "info".to_owned(),
        }
    }
}

impl ServerConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ServerError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

/// One account in a directory fixture.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountFixture {
    /// Account identifier
    pub aci: Uuid,
    /// Phone-number identifier
    pub pni: Uuid,
    /// Base64 access key, absent if the account refuses sealed sender
    #[serde(default)]
    pub access_key: Option<String>,
    /// Registered devices
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// Accounts to preload into a [`MemoryAccountDirectory`].
///
/// ```toml
/// [[accounts]]
/// aci = "5d9c5f7e-1f3b-4a5e-9c1d-2b7a8e6f4c30"
/// pni = "0b1c2d3e-4f50-4162-8374-95a6b7c8d9e0"
/// access_key = "AAECAwQFBgcICQoLDA0ODw=="
///
/// [[accounts.devices]]
/// id = 1
/// registration_id = 1234
/// fetches_messages = true
/// has_signed_pre_key = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryFixture {
    /// Accounts in the fixture
    #[serde(default)]
    pub accounts: Vec<AccountFixture>,
}

impl DirectoryFixture {
    /// Parse a fixture from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ServerError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a fixture file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Convert the fixture into accounts.
    pub fn into_accounts(self) -> Result<Vec<Account>, ServerError> {
        self.accounts
            .into_iter()
            .map(|fixture| {
                let access_key = fixture.access_key.as_deref().map(parse_access_key).transpose()?;
                Ok(Account { aci: fixture.aci, pni: fixture.pni, devices: fixture.devices, access_key })
            })
            .collect()
    }

    /// Build a directory holding the fixture's accounts.
    pub fn into_directory(self) -> Result<MemoryAccountDirectory, ServerError> {
        Ok(MemoryAccountDirectory::with_accounts(self.into_accounts()?))
    }
}

/// Decode a base64 access key.
pub fn parse_access_key(text: &str) -> Result<AccessKey, ServerError> {
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|err| ServerError::Fixture(format!("access key is not base64: {err}")))?;

    AccessKey::from_slice(&bytes)
        .ok_or_else(|| ServerError::Fixture(format!("access key must be 16 bytes, got {}", bytes.len())))
}

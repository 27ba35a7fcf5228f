//! Sealpost message-delivery core.
//!
//! Pure logic over narrow collaborator traits, with no runtime of its own:
//!
//! - [`reconcile`]: compares addressed devices with an account's enabled
//!   devices
//! - [`access`]: the sealed-sender and combined-key access gate
//! - [`dispatch`]: the engine that validates, reconciles, gates and fans a
//!   request out to per-device delivery units
//!
//! Storage, transport and scheduling are supplied by the caller through
//! [`AccountDirectory`], [`MessageSender`] and [`WorkerPool`]; time and
//! randomness through [`Environment`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod access;
pub mod account;
pub mod config;
pub mod delivery;
pub mod directory;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod reconcile;

pub use access::{AccessError, AuthenticatedSender, Credential};
pub use account::{
    ACCESS_KEY_LEN, AccessKey, Account, DEVICE_ACTIVITY_WINDOW_MILLIS, Device, DeviceSet,
    DeviceState, PRIMARY_DEVICE_ID,
};
pub use config::DispatchConfig;
pub use delivery::{
    DeliveryError, DeliveryOutcome, DeliveryTask, MessageSender, PoolError, WorkerPool,
};
pub use directory::AccountDirectory;
pub use dispatch::{DispatchEngine, MultiRecipientRequest, SingleRecipientRequest};
pub use env::Environment;
pub use error::DispatchError;
pub use reconcile::{ClaimedDevices, Reconciliation, reconcile};

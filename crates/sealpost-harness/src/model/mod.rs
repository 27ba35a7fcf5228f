//! Reference model for model-based testing.
//!
//! The model decides send requests over plain device tables, with no wire
//! format, no worker pool and no access-key arithmetic. It serves as the
//! oracle against which the real dispatch engine is verified.
//!
//! # Design Principles
//!
//! - Simplicity: the model should be obviously correct
//! - Deterministic: same inputs produce same outputs

pub mod operation;
mod world;

pub use operation::{
    AccountIndex, AccountSpec, KeyChoice, MAX_MODEL_DEVICES, ModelDevice, ModelIdentifier,
    ModelRecipient, Operation, OperationResult, STALE_OFFSET, aci, pni, registration_id,
};
pub use world::{ModelAccount, ModelDeviceState, ModelWorld, identifier, reduce_device};

//! Deterministic simulation harness for Sealpost dispatch testing.
//!
//! Provides a seeded [`Environment`](sealpost_core::Environment), a
//! fault-injecting worker pool and a reference model.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and the real engine,
//! and their results are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chaos;
pub mod model;
pub mod real;
pub mod sim_env;

pub use chaos::ChaoticPool;
pub use model::{
    AccountIndex, AccountSpec, KeyChoice, ModelDevice, ModelIdentifier, ModelRecipient, ModelWorld,
    Operation, OperationResult,
};
pub use real::RealWorld;
pub use sim_env::{SIM_EPOCH_MILLIS, SimEnv};

//! Sealpost server runtime.
//!
//! Concrete collaborators for the dispatch engine:
//! - Tokio for the worker pool
//! - In-memory account directory and recording message sender
//! - System time and cryptographic RNG
//!
//! ## Architecture
//!
//! ```text
//! sealpost-server
//!   ├─ SystemEnv               (production Environment impl)
//!   ├─ MemoryAccountDirectory  (AccountDirectory over a hash map)
//!   ├─ MemoryMessageSender     (MessageSender that records deliveries)
//!   ├─ TokioWorkerPool         (bounded WorkerPool)
//!   └─ Runtime                 (wires the above into a DispatchEngine)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod directory;
mod error;
pub mod pool;
pub mod report;
mod sender;
mod system_env;

use std::sync::Arc;

pub use config::{DirectoryFixture, ServerConfig, parse_access_key};
pub use directory::MemoryAccountDirectory;
pub use error::ServerError;
pub use pool::{PoolConfig, TokioWorkerPool};
pub use report::{PayloadSummary, Report};
use sealpost_core::{DispatchEngine, Environment};
pub use sender::{MemoryMessageSender, SentMessage};
pub use system_env::SystemEnv;

/// A dispatch engine wired to the in-memory collaborators.
///
/// The collaborators stay reachable so callers can seed accounts, inject
/// delivery failures and inspect what was sent.
pub struct Runtime<E = SystemEnv>
where
    E: Environment,
{
    /// The engine
    pub engine: DispatchEngine<E>,
    /// Account store the engine resolves against
    pub directory: Arc<MemoryAccountDirectory>,
    /// Transport the engine delivers through
    pub sender: Arc<MemoryMessageSender>,
    /// Pool the engine runs batches on
    pub pool: Arc<TokioWorkerPool>,
}

impl Runtime<SystemEnv> {
    /// Build a runtime using the system clock and RNG.
    pub fn new(config: &ServerConfig, directory: MemoryAccountDirectory) -> Self {
        Self::with_env(SystemEnv::new(), config, directory)
    }
}

impl<E> Runtime<E>
where
    E: Environment,
{
    /// Build a runtime over a custom environment.
    pub fn with_env(env: E, config: &ServerConfig, directory: MemoryAccountDirectory) -> Self {
        let directory = Arc::new(directory);
        let sender = Arc::new(MemoryMessageSender::new());
        let pool = Arc::new(TokioWorkerPool::new(config.pool));

        let engine = DispatchEngine::new(
            env,
            directory.clone(),
            sender.clone(),
            pool.clone(),
            config.dispatch,
        );

        Self { engine, directory, sender, pool }
    }

    /// Stop accepting new batches.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

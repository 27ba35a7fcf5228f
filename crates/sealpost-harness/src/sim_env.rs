//! Deterministic Environment for simulation.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sealpost_core::Environment;

/// Start of simulated time (2023-11-14T22:13:20Z).
pub const SIM_EPOCH_MILLIS: u64 = 1_700_000_000_000;

/// Simulation environment with a manual clock and a seeded RNG.
///
/// Clones share the clock and the RNG stream, so every component handed a
/// clone observes the same time and draws from one sequence.
///
/// # Invariants
///
/// - Determinism: the same seed yields the same byte sequence
/// - Monotonicity: the clock only moves forward
#[derive(Clone)]
pub struct SimEnv {
    seed: u64,
    now: Arc<AtomicU64>,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SimEnv {
    /// Create an environment at [`SIM_EPOCH_MILLIS`] with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            now: Arc::new(AtomicU64::new(SIM_EPOCH_MILLIS)),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }

    /// Seed this environment was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Move the clock forward.
    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Draw a value in `0..bound`. Returns 0 for a zero bound.
    pub fn random_below(&self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.random_u64() % bound
    }
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv")
            .field("seed", &self.seed)
            .field("now", &self.now.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Environment for SimEnv {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}

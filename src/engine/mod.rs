//! Engine layer: the critical section, round execution, and timers.
//!
//! [`PairingEngine`] is the conflict resolver: every pool, ledger, and
//! session mutation passes through its single mutex, including the
//! acceptance and session-duration timer callbacks.

pub mod pairing_engine;
pub mod scheduler;
pub mod snapshot;

pub use pairing_engine::{PairingEngine, RoundReport};
pub use snapshot::EngineSnapshot;

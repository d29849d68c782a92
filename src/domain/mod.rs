//! Domain layer: participants, pairs, pool, ledger, matcher, and events.
//!
//! This module contains the server-side domain model: participant and
//! pair identity, the participant pool, the history ledger enforcing the
//! no-repeat constraint, the matching algorithm, and the event system.
//! All types here are lock-free data structures; the engine layer owns
//! the critical section that serializes access to them.

pub mod event;
pub mod event_bus;
pub mod ledger;
pub mod matcher;
pub mod pair;
pub mod participant;
pub mod pool;

pub use event::PairingEvent;
pub use event_bus::EventBus;
pub use ledger::{HistoryLedger, HistoryRecord, PairKey};
pub use matcher::MatchOutcome;
pub use pair::{PairId, PairSession, SessionState};
pub use participant::{Participant, ParticipantId, ParticipantState};
pub use pool::ParticipantPool;

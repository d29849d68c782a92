//! # pairlink
//!
//! REST API and WebSocket service around a round-based pairing engine.
//!
//! Participants join a shared pool and are matched into pairs each
//! round. A history ledger prevents recent repeats within a rolling
//! lookback window, and every session walks a small state machine from
//! proposal through acknowledgement to completion or expiry.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── PairingEngine (engine/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── ParticipantPool / HistoryLedger / matcher (domain/)
//!     │
//!     └── PostgreSQL Persistence
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod ws;

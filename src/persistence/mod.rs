//! Persistence layer: PostgreSQL event log and engine snapshots.
//!
//! Stores every pairing lifecycle event in an append-only log and
//! checkpoints the engine state after each round. The concrete
//! implementation uses `sqlx::PgPool` for async PostgreSQL access.

pub mod models;
pub mod postgres;
pub mod recorder;

//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams pairing lifecycle events to
//! clients, filtered per connection by participant id.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;

//! Relay transport layer.
//!
//! Axum WebSocket transport for the relay: HTTP upgrade, one lifecycle
//! task per connection, health reporting, and graceful shutdown. Dispatch
//! policy is decoupled into relay-core — this layer only moves frames and
//! manages connection lifetimes.

mod connection;
pub mod server;

pub use server::{RelayServer, ServerConfig};

//! Relay core — connection registry and message dispatch.
//!
//! The `ClientRegistry` is the only state shared across connections; the
//! `Dispatcher` reads point-in-time snapshots of it per broadcast, so
//! fan-out never races registry mutation. Delivery goes through per-client
//! outbound queues — a dead recipient is pruned without disturbing the
//! rest of a fan-out.

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod registry;

pub use client::ClientHandle;
pub use dispatcher::Dispatcher;
pub use error::RelayError;
pub use registry::ClientRegistry;

//! Relay wire protocol.
//!
//! JSON message types exchanged over each WebSocket connection.
//! This crate is the single source of truth for envelope shapes,
//! the inbound frame representation, and decode errors.

pub mod codec;
pub mod envelope;

pub use codec::{DecodeError, InboundFrame, decode, encode};
pub use envelope::{ClientId, Envelope, ErrorText};

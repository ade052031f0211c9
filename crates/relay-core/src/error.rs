//! Relay failure taxonomy.

use relay_protocol::{ClientId, DecodeError};
use thiserror::Error;

/// Failures arising while handling a single connection or message.
///
/// All of these are recovered locally — nothing here propagates to the
/// server controller or to other connections.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The inbound frame could not be decoded. Answered with an `error`
    /// envelope; the connection stays open.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] DecodeError),

    /// A send to this client failed. Recovered by unregistering it; never
    /// aborts a fan-out to the remaining recipients.
    #[error("delivery to client {0} failed")]
    DeliveryFailure(ClientId),

    /// The transport closed, normally or not. Cleanup, not an error.
    #[error("transport closed")]
    TransportClosed,

    /// Unexpected failure while processing one message or running a
    /// per-connection task.
    #[error("unhandled fault: {0}")]
    UnhandledFault(String),
}

//! Client connection handles.

use relay_protocol::{ClientId, Envelope};
use tokio::sync::mpsc;

use crate::error::RelayError;

/// A non-owning reference to one open connection: the client's id plus the
/// sending half of its outbound queue.
///
/// The connection's lifecycle task owns the transport; the registry and
/// dispatcher only ever hold handles. Dropping a handle never closes the
/// underlying socket.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ClientId,
    outbound: mpsc::UnboundedSender<Envelope>,
}

impl ClientHandle {
    pub fn new(id: ClientId, outbound: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { id, outbound }
    }

    /// Create a handle together with the receiving half of its outbound
    /// queue. The caller's writer task drains the receiver.
    pub fn channel(id: ClientId) -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(id, tx), rx)
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Queue an envelope for delivery. The connection's writer task encodes
    /// and writes queued envelopes in order, preserving per-connection FIFO.
    pub fn send(&self, envelope: Envelope) -> Result<(), RelayError> {
        self.outbound
            .send(envelope)
            .map_err(|_| RelayError::DeliveryFailure(self.id))
    }
}

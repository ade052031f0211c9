//! Dispatcher — decides what each inbound message produces and for whom.

use std::sync::Arc;

use relay_protocol::{Envelope, ErrorText, InboundFrame, decode};
use tracing::{debug, warn};

use crate::client::ClientHandle;
use crate::error::RelayError;
use crate::registry::ClientRegistry;

/// Message dispatch policy, first match wins:
///
/// 1. `ping` → one `pong` to the sender.
/// 2. `broadcast` → relay to a snapshot of everyone else, then one
///    `confirmation` to the sender (zero recipients is still success).
/// 3. anything else, including absent `type` → one `echo` to the sender.
/// 4. undecodable input → one `error` envelope to the sender.
///
/// All replies go through `ClientHandle::send`, never a transport
/// directly, so a failed send is uniformly converted into registry
/// cleanup.
pub struct Dispatcher {
    registry: Arc<ClientRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }

    /// Handle one raw inbound frame from `origin`.
    ///
    /// Returns `Err` only when `origin` itself is unreachable; failures
    /// delivering to other recipients are absorbed here.
    pub fn dispatch(&self, origin: &ClientHandle, raw: &str) -> Result<(), RelayError> {
        match decode(raw) {
            Ok(frame) => self.route(origin, frame),
            Err(e) => {
                let fault = RelayError::MalformedPayload(e);
                debug!(client = %origin.id(), error = %fault, "undecodable frame");
                origin.send(Envelope::error(ErrorText::INVALID_FORMAT))
            }
        }
    }

    fn route(&self, origin: &ClientHandle, frame: InboundFrame) -> Result<(), RelayError> {
        match frame.kind() {
            Some("ping") => origin.send(Envelope::pong()),
            Some("broadcast") => {
                let relayed = Envelope::broadcast(frame.message(), origin.id());
                for peer in self.registry.snapshot(Some(origin.id())) {
                    self.deliver(&peer, relayed.clone());
                }
                origin.send(Envelope::confirmation())
            }
            _ => origin.send(Envelope::echo(frame.into_body())),
        }
    }

    /// Attempt delivery to one recipient. A failure unregisters that
    /// recipient and never aborts the surrounding fan-out.
    fn deliver(&self, target: &ClientHandle, envelope: Envelope) {
        if let Err(e) = target.send(envelope) {
            warn!(client = %target.id(), error = %e, "delivery failed, removing client");
            self.registry.unregister(target.id());
        }
    }
}

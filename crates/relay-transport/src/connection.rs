//! Per-connection lifecycle.
//!
//! Each accepted WebSocket gets two tasks: the read loop below and a
//! writer task draining the client's outbound queue. Registration happens
//! before the first read; unregistration is guaranteed by a drop guard so
//! it runs exactly once on every exit path, including panics mid-message.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use relay_core::{ClientHandle, ClientRegistry, Dispatcher, RelayError};
use relay_protocol::{ClientId, Envelope, ErrorText, encode};
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace, warn};

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Unregisters the client when dropped — the single cleanup choke point.
/// `unregister` is idempotent, so racing the writer task's failure-path
/// removal is harmless.
struct CleanupGuard {
    id: ClientId,
    registry: Arc<ClientRegistry>,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

pub(crate) async fn handle_connection(
    socket: WebSocket,
    registry: Arc<ClientRegistry>,
    dispatcher: Arc<Dispatcher>,
    mut shutdown: watch::Receiver<bool>,
) {
    let id = ClientId::new();
    let mut state = ConnState::Connecting;
    trace!(client = %id, ?state, "connection accepted");

    let (ws_tx, mut ws_rx) = socket.split();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let handle = ClientHandle::new(id, out_tx);

    let writer = tokio::spawn(write_loop(ws_tx, out_rx, id, registry.clone()));

    registry.register(handle.clone());
    let cleanup = CleanupGuard {
        id,
        registry: registry.clone(),
    };
    state = ConnState::Open;
    trace!(client = %id, ?state, "registered");

    while state == ConnState::Open {
        tokio::select! {
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match dispatcher.dispatch(&handle, &text) {
                        Ok(()) => {}
                        Err(RelayError::DeliveryFailure(_)) => {
                            // Our own outbound queue is gone; stop reading.
                            state = ConnState::Closing;
                        }
                        Err(fault) => {
                            warn!(client = %id, error = %fault, "message handling failed");
                            if handle.send(Envelope::error(ErrorText::INTERNAL)).is_err() {
                                state = ConnState::Closing;
                            }
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!(client = %id, "client closed connection");
                    state = ConnState::Closing;
                }
                Some(Err(e)) => {
                    // A disconnect is cleanup, not an error.
                    debug!(client = %id, error = %e, "transport closed");
                    state = ConnState::Closing;
                }
                // Ping/pong control frames are answered by the transport.
                Some(Ok(_)) => {}
            },
            _ = shutdown.changed() => {
                debug!(client = %id, "server stopping, closing connection");
                state = ConnState::Closing;
            }
        }
    }
    trace!(client = %id, ?state, "read loop ended");

    // Closing → Closed: unregister, then close the outbound queue so the
    // writer drains what is already queued and exits.
    drop(cleanup);
    drop(handle);
    if let Err(e) = writer.await {
        let fault = RelayError::UnhandledFault(e.to_string());
        warn!(client = %id, error = %fault, "writer task fault");
    }
    state = ConnState::Closed;
    trace!(client = %id, ?state, "connection finished");
}

/// Drains the outbound queue, encoding and writing each envelope in order.
/// A write failure drops the client from the registry immediately; the
/// rest of the queue is discarded with it.
async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::UnboundedReceiver<Envelope>,
    id: ClientId,
    registry: Arc<ClientRegistry>,
) {
    while let Some(envelope) = outbound.recv().await {
        let text = encode(&envelope);
        if let Err(e) = sink.send(Message::Text(text.into())).await {
            warn!(client = %id, envelope = envelope.kind(), error = %e, "send failed, dropping client");
            registry.unregister(id);
            return;
        }
        trace!(client = %id, envelope = envelope.kind(), "sent");
    }
    let _ = sink.close().await;
}

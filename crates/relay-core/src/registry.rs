//! ClientRegistry — the shared set of currently-open connections.

use std::collections::HashMap;

use parking_lot::RwLock;
use relay_protocol::{ClientId, Envelope};
use tracing::{info, warn};

use crate::client::ClientHandle;

/// The authoritative set of currently-open connections.
///
/// Membership tracks the connection lifecycle exactly: a client is a
/// member while its lifecycle task is running a read loop for it. Mutated
/// only via `register`/`unregister`, both safe under concurrent callers
/// from many connection tasks. Holds handles, never transports — removal
/// never closes a socket.
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<ClientId, ClientHandle>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client and greet it with a `welcome` envelope carrying its id
    /// and the post-insert membership count. Call exactly once per
    /// connection lifetime.
    pub fn register(&self, handle: ClientHandle) {
        let id = handle.id();
        let clients = {
            let mut clients = self.clients.write();
            clients.insert(id, handle.clone());
            clients.len()
        };
        info!(client = %id, total = clients, "client connected");

        // Best-effort: a client that vanishes this early is cleaned up by
        // its own lifecycle task.
        if handle.send(Envelope::welcome(id, clients)).is_err() {
            warn!(client = %id, "failed to send welcome, client already gone");
        }
    }

    /// Remove a client if present. Callable from multiple failure paths
    /// without coordination; an absent id is a silent no-op.
    pub fn unregister(&self, id: ClientId) {
        let removed = self.clients.write().remove(&id);
        if removed.is_some() {
            info!(client = %id, total = self.size(), "client disconnected");
        }
    }

    /// A point-in-time copy of the current members, minus `excluding`.
    /// Safe to iterate after return even while the registry is mutated.
    pub fn snapshot(&self, excluding: Option<ClientId>) -> Vec<ClientHandle> {
        self.clients
            .read()
            .values()
            .filter(|handle| Some(handle.id()) != excluding)
            .cloned()
            .collect()
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.read().contains_key(&id)
    }

    /// Current membership count. May be momentarily stale under concurrent
    /// mutation; informational only.
    pub fn size(&self) -> usize {
        self.clients.read().len()
    }

    /// Remove and return every member. Used during server shutdown.
    pub fn drain(&self) -> Vec<ClientHandle> {
        let drained: Vec<ClientHandle> = {
            let mut clients = self.clients.write();
            clients.drain().map(|(_, handle)| handle).collect()
        };
        if !drained.is_empty() {
            info!(count = drained.len(), "registry drained");
        }
        drained
    }
}

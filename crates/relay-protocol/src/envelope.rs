//! Server-originated message envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for one client connection.
///
/// Generated at registration time and stable for the connection's lifetime.
/// Serialized as the hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// An outgoing message envelope. Constructed, serialized, and discarded
/// per exchange — never persisted.
///
/// The `timestamp` is assigned at construction (send) time. The wire tag
/// is the lowercase variant name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    /// Sent to a client once, right after it is registered.
    Welcome {
        message: String,
        client_id: ClientId,
        /// Registry size after this client joined. Informational.
        clients: usize,
        timestamp: DateTime<Utc>,
    },
    /// Reply to an inbound `ping`.
    Pong {
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// A relayed broadcast, delivered to every open connection except the
    /// sender. `client_id` identifies the sender.
    Broadcast {
        message: Value,
        client_id: ClientId,
        timestamp: DateTime<Utc>,
    },
    /// Sent to the broadcast sender once fan-out has been attempted.
    Confirmation {
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// Default reply: wraps the decoded inbound payload.
    Echo {
        original_message: Value,
        timestamp: DateTime<Utc>,
    },
    /// Reply for undecodable or unprocessable input.
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl Envelope {
    pub fn welcome(client_id: ClientId, clients: usize) -> Self {
        Self::Welcome {
            message: "Welcome to the relay server!".into(),
            client_id,
            clients,
            timestamp: Utc::now(),
        }
    }

    pub fn pong() -> Self {
        Self::Pong {
            message: "Server is alive!".into(),
            timestamp: Utc::now(),
        }
    }

    pub fn broadcast(message: Value, sender: ClientId) -> Self {
        Self::Broadcast {
            message,
            client_id: sender,
            timestamp: Utc::now(),
        }
    }

    pub fn confirmation() -> Self {
        Self::Confirmation {
            message: "Message broadcasted successfully".into(),
            timestamp: Utc::now(),
        }
    }

    pub fn echo(original_message: Value) -> Self {
        Self::Echo {
            original_message,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// The wire tag of this envelope, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::Pong { .. } => "pong",
            Self::Broadcast { .. } => "broadcast",
            Self::Confirmation { .. } => "confirmation",
            Self::Echo { .. } => "echo",
            Self::Error { .. } => "error",
        }
    }
}

/// Error envelope texts.
pub struct ErrorText;

impl ErrorText {
    /// Inbound frame could not be decoded.
    pub const INVALID_FORMAT: &str = "Invalid JSON format";
    /// Unexpected failure while handling one message.
    pub const INTERNAL: &str = "Internal server error";
}

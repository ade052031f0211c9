//! Inbound frame decoding and envelope encoding.
//!
//! Decoding is lenient about the `type` tag: unknown and absent types are
//! valid frames (the dispatcher treats them as the echo case). It rejects
//! input that is not a JSON object, or whose `type` field is not a string.

use serde_json::Value;
use thiserror::Error;

use crate::envelope::Envelope;

/// Why an inbound frame could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload must be a JSON object")]
    NotAnObject,
    #[error("`type` field must be a string")]
    BadTypeTag,
}

/// A decoded inbound frame: the original JSON object plus its `type` tag.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    kind: Option<String>,
    body: Value,
}

impl InboundFrame {
    /// The `type` tag, if the frame carried one.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    /// The `message` field of the frame, defaulting to an empty string
    /// when absent.
    pub fn message(&self) -> Value {
        self.body
            .get("message")
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()))
    }
}

/// Decode one inbound text frame.
///
/// A `type` of JSON `null` is treated the same as an absent `type`.
pub fn decode(raw: &str) -> Result<InboundFrame, DecodeError> {
    let body: Value = serde_json::from_str(raw)?;
    if !body.is_object() {
        return Err(DecodeError::NotAnObject);
    }

    let kind = match body.get("type") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(DecodeError::BadTypeTag),
    };

    Ok(InboundFrame { kind, body })
}

/// Encode an envelope to its wire form. Total for every well-formed
/// envelope: the enum carries only string-keyed JSON data.
pub fn encode(envelope: &Envelope) -> String {
    serde_json::to_string(envelope).expect("envelope serializes to JSON")
}

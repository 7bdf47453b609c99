//! Wire message shapes: inbound classification and roster broadcasts.
//!
//! Inbound frames are decoded once into [`InboundMessage`] and then
//! dispatched by exhaustive match; the relay never probes raw JSON fields
//! at routing time. Routed payloads are forwarded as the original text,
//! byte-for-byte; the relay adds nothing, not even a sender field.

use serde::{Deserialize, Serialize};

use super::ClientId;

/// Classified shape of one inbound text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Payload carrying a `target` field: forward verbatim to that client.
    Route {
        /// Destination identifier.
        target: ClientId,
    },
    /// `{"type": "get_users"}`: reply with a personal roster snapshot.
    GetUsers,
    /// Valid JSON object matching neither recognized shape: dropped.
    Unrecognized,
}

impl InboundMessage {
    /// Classifies a raw text frame.
    ///
    /// A string-valued `target` field takes precedence over `type`:
    /// routed signaling payloads may carry their own `type` fields that
    /// are opaque to the relay. Valid JSON that is not an object (or an
    /// object matching neither shape) classifies as [`Unrecognized`].
    ///
    /// # Errors
    ///
    /// Returns the decode error if the frame is not valid JSON.
    ///
    /// [`Unrecognized`]: InboundMessage::Unrecognized
    pub fn classify(raw: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let Some(fields) = value.as_object() else {
            return Ok(Self::Unrecognized);
        };
        if let Some(target) = fields.get("target").and_then(|v| v.as_str()) {
            return Ok(Self::Route {
                target: ClientId::from(target),
            });
        }
        match fields.get("type").and_then(|v| v.as_str()) {
            Some("get_users") => Ok(Self::GetUsers),
            _ => Ok(Self::Unrecognized),
        }
    }
}

/// Server → client messages originated by the relay itself.
///
/// Serializes with a `type` discriminator, e.g.
/// `{"type": "users", "users": ["a1b2c3d4", "e5f6a7b8"]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Roster snapshot, broadcast on membership change and sent as the
    /// reply to `get_users`.
    Users {
        /// Currently connected identifiers; no ordering contract.
        users: Vec<ClientId>,
    },
}

impl OutboundMessage {
    /// Serializes the message to its wire form.
    #[must_use]
    pub fn to_frame(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

//! Opaque client identifier.
//!
//! [`ClientId`] is a newtype wrapper around [`String`]. Identifiers are
//! supplied by clients (typically obtained from `GET /generate_id`), are
//! never validated for format or uniqueness, and are only meaningful for
//! the lifetime of one connection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier naming one connected peer.
///
/// Used as the dictionary key in [`super::ClientRegistry`], as the
/// `target` field of routed signaling messages, and as the elements of
/// roster broadcasts. Opaque to the relay: any non-empty UTF-8 token a
/// client presents in the WebSocket path is accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Generates a fresh candidate identifier: the first 8 hex characters
    /// of a UUID v4.
    ///
    /// There is no registry collision check and no reservation; a client
    /// could still fail to claim the returned token.
    #[must_use]
    pub fn generate() -> Self {
        let mut token = uuid::Uuid::new_v4().simple().to_string();
        token.truncate(8);
        Self(token)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClientId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for ClientId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

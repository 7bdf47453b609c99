//! Domain layer: client identity, the connection registry, and wire
//! message shapes.
//!
//! This module contains the relay's core model: opaque client
//! identifiers, the exclusive-access registry mapping each identifier to
//! its outbound channel, and the classified inbound/outbound message
//! types.

pub mod client_id;
pub mod client_registry;
pub mod message;

pub use client_id::ClientId;
pub use client_registry::{ClientHandle, ClientRegistry, ClientSender};
pub use message::{InboundMessage, OutboundMessage};

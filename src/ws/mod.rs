//! WebSocket layer: connection lifecycle and upgrade handling.
//!
//! The WebSocket endpoint at `/ws/{client_id}` carries all signaling
//! traffic: roster updates from the server and opaque routed payloads
//! between clients.

pub mod connection;
pub mod handler;

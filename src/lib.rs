//! # parley-relay
//!
//! WebSocket signaling relay for browser-to-browser real-time voice
//! sessions.
//!
//! Clients connect at `/ws/{client_id}`, receive roster broadcasts
//! whenever membership changes, and exchange opaque signaling payloads
//! (offers, answers, ICE candidates) routed by a `target` field. The
//! relay carries no media, guarantees nothing beyond at-most-once
//! best-effort delivery, and keeps no state outside the in-memory
//! registry of live connections.
//!
//! ## Architecture
//!
//! ```text
//! Browser clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)      /  /health  /generate_id
//!     ├── WS Handler (ws/)          /ws/{client_id}
//!     │
//!     ├── RelayService (service/)   roster broadcasts + routing
//!     │
//!     └── ClientRegistry (domain/)  identifier → outbound channel
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;

//! Relay service: turns registry events and inbound frames into sends.

use std::sync::Arc;

use crate::domain::{ClientId, ClientRegistry, ClientSender, InboundMessage, OutboundMessage};
use crate::error::RelayError;

/// Orchestration layer between connection tasks and the registry.
///
/// Owns a shared [`ClientRegistry`] and implements the relay protocol:
/// roster broadcasts on membership change, verbatim forwarding of
/// targeted payloads, and eviction of any client whose channel send
/// fails. A failed send is the sole signal used to infer disconnection;
/// there is no heartbeat or liveness probe.
#[derive(Debug, Clone)]
pub struct RelayService {
    registry: Arc<ClientRegistry>,
}

impl RelayService {
    /// Creates a new `RelayService` over the given registry.
    #[must_use]
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }

    /// Returns a reference to the inner [`ClientRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Registers a newly accepted connection and announces it.
    ///
    /// Sends the roster to the new client first (a personalized
    /// snapshot), then broadcasts the updated roster to every connected
    /// client. The new client therefore sees the roster twice; that
    /// redundancy is part of the wire protocol and is kept.
    ///
    /// Returns the connection serial to be passed back to
    /// [`on_disconnect`](Self::on_disconnect) at teardown.
    pub async fn on_connect(&self, id: ClientId, sender: ClientSender) -> u64 {
        let serial = self.registry.register(id.clone(), sender.clone()).await;
        tracing::info!(client = %id, serial, "client connected");

        let frame = self.roster_frame().await;
        if sender.send(frame).is_err() {
            tracing::debug!(client = %id, "client went away before the first roster");
        }
        self.broadcast_roster().await;
        serial
    }

    /// Deregisters a connection at teardown and announces the departure.
    ///
    /// The serial check makes this a no-op when the connection was
    /// already superseded by a reconnect under the same identifier, or
    /// already evicted by a failed send; only an actual removal triggers
    /// a broadcast.
    pub async fn on_disconnect(&self, id: &ClientId, serial: u64) {
        if self.registry.deregister(id, serial).await {
            tracing::info!(client = %id, "client disconnected");
            self.broadcast_roster().await;
        }
    }

    /// Broadcasts the current roster to every connected client.
    ///
    /// Takes one snapshot, serializes the roster message once, and sends
    /// it to every handle in the snapshot. Clients whose send fails are
    /// collected and batch-removed after the send pass; that cleanup
    /// deliberately does not trigger another broadcast, so the survivors
    /// learn of the eviction with the next membership change.
    pub async fn broadcast_roster(&self) {
        let snapshot = self.registry.snapshot().await;
        let users: Vec<ClientId> = snapshot.iter().map(|(id, _)| id.clone()).collect();
        let frame = OutboundMessage::Users { users }.to_frame();

        let mut stale = Vec::new();
        for (id, handle) in &snapshot {
            if handle.send(frame.clone()).is_err() {
                tracing::warn!(client = %id, "roster send failed; evicting");
                stale.push((id.clone(), handle.serial()));
            }
        }
        self.registry.remove_stale(&stale).await;
    }

    /// Dispatches one inbound text frame from `from`.
    ///
    /// The frame is classified once and dispatched exhaustively. All
    /// failure modes are returned for the connection loop to log; none
    /// of them is surfaced to the sender over the wire, and none is
    /// fatal to the connection.
    ///
    /// # Errors
    ///
    /// - [`RelayError::MalformedMessage`] if the frame is not valid JSON.
    /// - [`RelayError::UnrecognizedMessage`] if it matches no known shape.
    /// - [`RelayError::UnknownTarget`] if the named target is not
    ///   connected.
    /// - [`RelayError::ChannelClosed`] if a send failed; the affected
    ///   client has been evicted and survivors rebroadcast to.
    pub async fn route_message(&self, from: &ClientId, raw: &str) -> Result<(), RelayError> {
        match InboundMessage::classify(raw)? {
            InboundMessage::Route { target } => self.forward(from, &target, raw).await,
            InboundMessage::GetUsers => self.send_roster(from).await,
            InboundMessage::Unrecognized => Err(RelayError::UnrecognizedMessage),
        }
    }

    /// Forwards `raw` verbatim to `target`.
    async fn forward(
        &self,
        from: &ClientId,
        target: &ClientId,
        raw: &str,
    ) -> Result<(), RelayError> {
        let Some(handle) = self.registry.lookup(target).await else {
            return Err(RelayError::UnknownTarget(target.clone()));
        };
        if handle.send(raw.to_string()).is_err() {
            self.evict(target, handle.serial()).await;
            return Err(RelayError::ChannelClosed(target.clone()));
        }
        tracing::debug!(client = %from, target = %target, "message forwarded");
        Ok(())
    }

    /// Sends the roster to `to`'s own channel only.
    async fn send_roster(&self, to: &ClientId) -> Result<(), RelayError> {
        let Some(handle) = self.registry.lookup(to).await else {
            return Err(RelayError::UnknownTarget(to.clone()));
        };
        let frame = self.roster_frame().await;
        if handle.send(frame).is_err() {
            self.evict(to, handle.serial()).await;
            return Err(RelayError::ChannelClosed(to.clone()));
        }
        Ok(())
    }

    /// Treats a client whose send failed as disconnected.
    async fn evict(&self, id: &ClientId, serial: u64) {
        if self.registry.deregister(id, serial).await {
            tracing::warn!(client = %id, "send failed; treating client as disconnected");
            self.broadcast_roster().await;
        }
    }

    /// Serializes the current roster.
    async fn roster_frame(&self) -> String {
        OutboundMessage::Users {
            users: self.registry.ids().await,
        }
        .to_frame()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashSet;

    use tokio::sync::mpsc;

    use super::*;

    fn relay() -> RelayService {
        RelayService::new(Arc::new(ClientRegistry::new()))
    }

    fn channel() -> (ClientSender, mpsc::UnboundedReceiver<String>) {
        mpsc::unbounded_channel()
    }

    async fn next_frame(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
        let Some(frame) = rx.recv().await else {
            panic!("channel closed while expecting a frame");
        };
        frame
    }

    fn users_set(frame: &str) -> HashSet<String> {
        let parsed: Option<OutboundMessage> = serde_json::from_str(frame).ok();
        let Some(OutboundMessage::Users { users }) = parsed else {
            panic!("expected a users frame, got: {frame}");
        };
        users.into_iter().map(String::from).collect()
    }

    fn set_of(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| (*id).to_string()).collect()
    }

    #[tokio::test]
    async fn connect_sends_personal_snapshot_then_broadcast() {
        let relay = relay();
        let (tx, mut rx) = channel();
        let _ = relay.on_connect(ClientId::from("alice"), tx).await;

        // Personalized snapshot, then the broadcast that includes the
        // new client again.
        assert_eq!(users_set(&next_frame(&mut rx).await), set_of(&["alice"]));
        assert_eq!(users_set(&next_frame(&mut rx).await), set_of(&["alice"]));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn roster_converges_for_both_clients() {
        let relay = relay();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, mut rx_b) = channel();
        let _ = relay.on_connect(ClientId::from("alice"), tx_a).await;
        let _ = relay.on_connect(ClientId::from("bob"), tx_b).await;

        // Alice: two single-entry frames from her own connect, then the
        // broadcast triggered by Bob's.
        let _ = next_frame(&mut rx_a).await;
        let _ = next_frame(&mut rx_a).await;
        assert_eq!(
            users_set(&next_frame(&mut rx_a).await),
            set_of(&["alice", "bob"])
        );

        // Bob: personalized snapshot and broadcast both already contain
        // both clients.
        assert_eq!(
            users_set(&next_frame(&mut rx_b).await),
            set_of(&["alice", "bob"])
        );
        assert_eq!(
            users_set(&next_frame(&mut rx_b).await),
            set_of(&["alice", "bob"])
        );
    }

    #[tokio::test]
    async fn routed_payload_arrives_verbatim() {
        let relay = relay();
        let (tx_a, _rx_a) = channel();
        let (tx_b, mut rx_b) = channel();
        let _ = relay.on_connect(ClientId::from("alice"), tx_a).await;
        let _ = relay.on_connect(ClientId::from("bob"), tx_b).await;
        let _ = next_frame(&mut rx_b).await;
        let _ = next_frame(&mut rx_b).await;

        let raw = r#"{"target": "bob", "payload": "hello", "candidate": {"port": 9}}"#;
        let result = relay.route_message(&ClientId::from("alice"), raw).await;
        assert!(result.is_ok());

        assert_eq!(next_frame(&mut rx_b).await, raw);
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn unknown_target_is_dropped() {
        let relay = relay();
        let (tx_a, mut rx_a) = channel();
        let _ = relay.on_connect(ClientId::from("alice"), tx_a).await;
        let _ = next_frame(&mut rx_a).await;
        let _ = next_frame(&mut rx_a).await;

        let result = relay
            .route_message(&ClientId::from("alice"), r#"{"target": "ghost"}"#)
            .await;
        assert!(matches!(result, Err(RelayError::UnknownTarget(_))));

        // Nothing was delivered anywhere and alice is still registered.
        assert!(rx_a.try_recv().is_err());
        assert_eq!(relay.registry().len().await, 1);
    }

    #[tokio::test]
    async fn failed_direct_send_evicts_target_and_rebroadcasts() {
        let relay = relay();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, rx_b) = channel();
        let _ = relay.on_connect(ClientId::from("alice"), tx_a).await;
        let _ = relay.on_connect(ClientId::from("bob"), tx_b).await;
        let _ = next_frame(&mut rx_a).await;
        let _ = next_frame(&mut rx_a).await;
        let _ = next_frame(&mut rx_a).await;

        // Bob's connection task is gone.
        drop(rx_b);

        let result = relay
            .route_message(&ClientId::from("alice"), r#"{"target": "bob"}"#)
            .await;
        assert!(matches!(result, Err(RelayError::ChannelClosed(_))));

        // Bob was removed and the survivors got a fresh roster.
        assert_eq!(users_set(&next_frame(&mut rx_a).await), set_of(&["alice"]));
        assert!(relay.registry().lookup(&ClientId::from("bob")).await.is_none());
    }

    #[tokio::test]
    async fn broadcast_collects_failures_without_recursing() {
        let relay = relay();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, rx_b) = channel();
        let _ = relay.on_connect(ClientId::from("alice"), tx_a).await;
        let _ = relay.on_connect(ClientId::from("bob"), tx_b).await;
        let _ = next_frame(&mut rx_a).await;
        let _ = next_frame(&mut rx_a).await;
        let _ = next_frame(&mut rx_a).await;
        drop(rx_b);

        relay.broadcast_roster().await;

        // The pass that detected the failure was built from the old
        // snapshot; no follow-up broadcast is issued for the eviction.
        assert_eq!(
            users_set(&next_frame(&mut rx_a).await),
            set_of(&["alice", "bob"])
        );
        assert!(rx_a.try_recv().is_err());
        assert_eq!(relay.registry().len().await, 1);

        // The next membership-driven broadcast excludes the evictee.
        relay.broadcast_roster().await;
        assert_eq!(users_set(&next_frame(&mut rx_a).await), set_of(&["alice"]));
    }

    #[tokio::test]
    async fn get_users_replies_to_sender_only() {
        let relay = relay();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, mut rx_b) = channel();
        let _ = relay.on_connect(ClientId::from("alice"), tx_a).await;
        let _ = relay.on_connect(ClientId::from("bob"), tx_b).await;
        let _ = next_frame(&mut rx_a).await;
        let _ = next_frame(&mut rx_a).await;
        let _ = next_frame(&mut rx_a).await;
        let _ = next_frame(&mut rx_b).await;
        let _ = next_frame(&mut rx_b).await;

        let result = relay
            .route_message(&ClientId::from("alice"), r#"{"type": "get_users"}"#)
            .await;
        assert!(result.is_ok());

        let frame = next_frame(&mut rx_a).await;
        assert!(users_set(&frame).contains("alice"));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn get_users_send_failure_evicts_sender() {
        let relay = relay();
        let (tx_a, rx_a) = channel();
        let _ = relay.on_connect(ClientId::from("alice"), tx_a).await;
        drop(rx_a);

        let result = relay
            .route_message(&ClientId::from("alice"), r#"{"type": "get_users"}"#)
            .await;
        assert!(matches!(result, Err(RelayError::ChannelClosed(_))));
        assert!(relay.registry().is_empty().await);
    }

    #[tokio::test]
    async fn malformed_and_unrecognized_frames_are_rejected() {
        let relay = relay();
        let (tx_a, _rx_a) = channel();
        let _ = relay.on_connect(ClientId::from("alice"), tx_a).await;

        let malformed = relay
            .route_message(&ClientId::from("alice"), "not json{{")
            .await;
        assert!(matches!(malformed, Err(RelayError::MalformedMessage(_))));

        let unrecognized = relay
            .route_message(&ClientId::from("alice"), r#"{"type": "offer"}"#)
            .await;
        assert!(matches!(unrecognized, Err(RelayError::UnrecognizedMessage)));

        // Neither drops the sender from the registry.
        assert_eq!(relay.registry().len().await, 1);
    }

    #[tokio::test]
    async fn duplicate_identifier_replaces_and_routes_to_newcomer() {
        let relay = relay();
        let (tx_1, mut rx_1) = channel();
        let first = relay.on_connect(ClientId::from("alice"), tx_1).await;

        let (tx_2, mut rx_2) = channel();
        let _second = relay.on_connect(ClientId::from("alice"), tx_2).await;

        // The first connection drains what it was sent, then finds its
        // queue closed: the registry dropped its handle on overwrite.
        let _ = next_frame(&mut rx_1).await;
        let _ = next_frame(&mut rx_1).await;
        assert!(rx_1.recv().await.is_none());

        // The superseded connection's teardown must not evict the
        // replacement or announce anything.
        relay.on_disconnect(&ClientId::from("alice"), first).await;
        assert_eq!(relay.registry().len().await, 1);

        let (tx_c, _rx_c) = channel();
        let _ = relay.on_connect(ClientId::from("carol"), tx_c).await;
        let _ = next_frame(&mut rx_2).await;
        let _ = next_frame(&mut rx_2).await;
        let _ = next_frame(&mut rx_2).await;

        let raw = r#"{"target": "alice", "sdp": "v=0"}"#;
        let result = relay.route_message(&ClientId::from("carol"), raw).await;
        assert!(result.is_ok());
        assert_eq!(next_frame(&mut rx_2).await, raw);
    }

    #[tokio::test]
    async fn disconnect_is_idempotent_and_silent_when_absent() {
        let relay = relay();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, rx_b) = channel();
        let _ = relay.on_connect(ClientId::from("alice"), tx_a).await;
        let serial_b = relay.on_connect(ClientId::from("bob"), tx_b).await;
        let _ = next_frame(&mut rx_a).await;
        let _ = next_frame(&mut rx_a).await;
        let _ = next_frame(&mut rx_a).await;

        relay.on_disconnect(&ClientId::from("bob"), serial_b).await;
        assert_eq!(users_set(&next_frame(&mut rx_a).await), set_of(&["alice"]));

        // Second teardown of the same connection: no removal, no
        // broadcast.
        relay.on_disconnect(&ClientId::from("bob"), serial_b).await;
        assert!(rx_a.try_recv().is_err());
        drop(rx_b);
    }
}

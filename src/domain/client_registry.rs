//! Connected-client storage with exclusive-access mutation.
//!
//! [`ClientRegistry`] owns the authoritative set of currently connected
//! clients in a `HashMap` guarded by a single [`tokio::sync::RwLock`].
//! Every mutation takes the write lock; snapshots take the read lock, so
//! each observes one consistent view of membership.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tokio::sync::mpsc;

use super::ClientId;

/// Outbound channel for one connection, carrying serialized JSON frames.
///
/// The paired receiver lives in the connection task, which forwards each
/// frame to the WebSocket sink. A send fails only once that task has
/// dropped the receiver, which is the relay's sole disconnect signal.
pub type ClientSender = mpsc::UnboundedSender<String>;

/// Registry record for one connection: its outbound channel plus the
/// serial assigned when it registered.
///
/// The serial distinguishes two connections that claimed the same
/// identifier, so teardown of a superseded connection can never evict its
/// replacement from the registry.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    serial: u64,
    sender: ClientSender,
}

impl ClientHandle {
    /// Returns the connection serial assigned at registration.
    #[must_use]
    pub const fn serial(&self) -> u64 {
        self.serial
    }

    /// Queues a frame on the connection's outbound channel.
    ///
    /// # Errors
    ///
    /// Returns the frame back if the connection task has already dropped
    /// its receiver, i.e. the peer is gone.
    pub fn send(&self, frame: String) -> Result<(), mpsc::error::SendError<String>> {
        self.sender.send(frame)
    }
}

/// Authoritative map of connected clients.
///
/// # Concurrency
///
/// - `register` / `deregister` / `remove_stale` are linearized by the
///   write lock and never interleave on the same key.
/// - Snapshots are taken under the read lock and are each internally
///   consistent; handles cloned out of a snapshot may be used for sends
///   after the lock is released.
#[derive(Debug)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<ClientId, ClientHandle>>,
    next_serial: AtomicU64,
}

impl ClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            next_serial: AtomicU64::new(1),
        }
    }

    /// Inserts or overwrites the record for `id`, returning the serial
    /// assigned to this connection.
    ///
    /// On overwrite the superseded handle is dropped here. The registry
    /// holds the only long-lived sender clone, so the old connection's
    /// outbound queue closes and its task shuts the socket down.
    pub async fn register(&self, id: ClientId, sender: ClientSender) -> u64 {
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        let mut clients = self.clients.write().await;
        clients.insert(id, ClientHandle { serial, sender });
        serial
    }

    /// Removes the record for `id` if it still carries `serial`.
    ///
    /// Returns `true` if a record was removed. Idempotent: an absent id
    /// or a stale serial is a no-op, so a superseded connection's
    /// teardown leaves its replacement in place.
    pub async fn deregister(&self, id: &ClientId, serial: u64) -> bool {
        let mut clients = self.clients.write().await;
        let current = clients.get(id).is_some_and(|handle| handle.serial == serial);
        if current {
            clients.remove(id);
        }
        current
    }

    /// Removes every record still matching one of the given
    /// (identifier, serial) pairs, taking the write lock once.
    ///
    /// Used by broadcast cleanup to evict clients whose sends failed,
    /// after the send pass has finished iterating its snapshot.
    pub async fn remove_stale(&self, stale: &[(ClientId, u64)]) {
        if stale.is_empty() {
            return;
        }
        let mut clients = self.clients.write().await;
        for (id, serial) in stale {
            if clients.get(id).is_some_and(|handle| handle.serial == *serial) {
                clients.remove(id);
            }
        }
    }

    /// Returns the handle for `id`, if connected.
    pub async fn lookup(&self, id: &ClientId) -> Option<ClientHandle> {
        self.clients.read().await.get(id).cloned()
    }

    /// Returns an atomic snapshot of all (identifier, handle) pairs.
    pub async fn snapshot(&self) -> Vec<(ClientId, ClientHandle)> {
        let clients = self.clients.read().await;
        clients
            .iter()
            .map(|(id, handle)| (id.clone(), handle.clone()))
            .collect()
    }

    /// Returns an atomic snapshot of the connected identifiers.
    ///
    /// No ordering guarantee: the order is whatever the map yields.
    pub async fn ids(&self) -> Vec<ClientId> {
        self.clients.read().await.keys().cloned().collect()
    }

    /// Returns the number of connected clients.
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Returns `true` if no client is connected.
    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

use axum::extract::ws::Utf8Bytes;
use dashcast_core::types::ConnId;
use dashmap::{mapref::entry::Entry, DashMap};
use tokio::sync::mpsc;

/// Sending half of a client's outbound queue. The connection task owns the
/// receiving half and the socket; dropping every sender closes the client.
pub type Outbound = mpsc::Sender<Utf8Bytes>;

/// The set of currently open client connections.
///
/// A connection is a member iff it has been accepted and not yet closed.
/// Each operation is linearizable per key, so a snapshot never observes a
/// half-inserted or half-removed entry.
#[derive(Default)]
pub struct ConnectionRegistry {
    clients: DashMap<ConnId, Outbound>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. Returns false (and keeps the existing entry) when
    /// the id is already registered.
    pub fn register(&self, id: ConnId, tx: Outbound) -> bool {
        match self.clients.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(tx);
                true
            }
        }
    }

    /// Remove a connection. Returns false when it was already gone; both the
    /// disconnect path and a failed delivery may call this for the same id.
    pub fn unregister(&self, id: &ConnId) -> bool {
        self.clients.remove(id).is_some()
    }

    /// Owned copy of the current members, safe to iterate while other tasks
    /// register or unregister.
    pub fn snapshot(&self) -> Vec<(ConnId, Outbound)> {
        self.clients
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn members(&self) -> Vec<ConnId> {
        self.clients.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn contains(&self, id: &ConnId) -> bool {
        self.clients.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Drop every member. Their queues close once in-flight snapshots are
    /// released, which ends the connection tasks.
    pub fn clear(&self) {
        self.clients.clear();
    }
}

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::adapter::{ConnectionId, LocalAdapter, RoomAdapter};
use crate::models::ServerEvent;

/// Transport-side bookkeeping: outbound channel per live connection plus
/// the room membership capability.
pub struct ConnectionHub {
    adapter: Arc<dyn RoomAdapter>,
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
}

impl ConnectionHub {
    pub fn new(adapter: Arc<dyn RoomAdapter>) -> Self {
        Self {
            adapter,
            connections: DashMap::new(),
        }
    }

    pub fn with_local_adapter() -> Self {
        Self::new(Arc::new(LocalAdapter::new()))
    }

    pub fn adapter(&self) -> Arc<dyn RoomAdapter> {
        self.adapter.clone()
    }

    /// Register a freshly opened connection and return the receiving half
    /// of its outbound queue.
    pub fn register(&self, id: ConnectionId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.insert(id, tx);
        tracing::debug!("Registered connection {}", id);
        rx
    }

    /// Forget a closed connection and every room it was in.
    pub fn unregister(&self, id: ConnectionId) {
        self.connections.remove(&id);
        self.adapter.remove_all(id);
        tracing::debug!("Unregistered connection {}", id);
    }

    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn send_to(&self, id: ConnectionId, event: ServerEvent) -> bool {
        match self.connections.get(&id) {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Deliver `event` to every member of `room`, returning how many
    /// connections accepted it.
    pub fn broadcast(&self, room: &str, event: ServerEvent) -> usize {
        let delivered = self
            .adapter
            .members(room)
            .into_iter()
            .filter(|member| self.send_to(*member, event.clone()))
            .count();

        tracing::debug!("Broadcast '{}' to room '{}' reached {} connections", event.event, room, delivered);
        delivered
    }
}

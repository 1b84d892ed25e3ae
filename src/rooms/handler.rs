use std::sync::Arc;

use super::adapter::{ConnectionId, RoomAdapter};
use crate::models::ClientEvent;

/// Why a connection ended, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    ClientClosed,
    StreamEnded,
    TransportError(String),
}

/// Reacts to the room events of a single connection.
///
/// Room names are taken as-is, including the empty string, and neither event
/// reports a failure back to the peer.
#[derive(Clone)]
pub struct RoomMembershipHandler {
    adapter: Arc<dyn RoomAdapter>,
}

impl RoomMembershipHandler {
    pub fn new(adapter: Arc<dyn RoomAdapter>) -> Self {
        Self { adapter }
    }

    pub fn handle_event(&self, conn: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::JoinRoom(room) => self.join_room(conn, &room),
            ClientEvent::OutRoom(room) => self.out_room(conn, &room),
        }
    }

    pub fn join_room(&self, conn: ConnectionId, room: &str) {
        self.adapter.join(conn, room);
        tracing::debug!("Connection {} joined room '{}'", conn, room);
    }

    pub fn out_room(&self, conn: ConnectionId, room: &str) {
        self.adapter.leave(conn, room);
        tracing::debug!("Connection {} left room '{}'", conn, room);
    }

    /// Log the disconnection. Membership cleanup belongs to the transport.
    pub fn on_disconnect(&self, conn: ConnectionId, reason: &DisconnectReason) {
        tracing::info!("🔌 Connection {} disconnected ({:?})", conn, reason);
    }
}

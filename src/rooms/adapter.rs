use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a live real-time connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Room membership capability owned by the transport.
///
/// Rooms are created on first join and disappear with their last member.
/// Implementations must be safe to call from many connection tasks at once.
pub trait RoomAdapter: Send + Sync + 'static {
    /// Add `conn` to `room`. Joining twice is harmless.
    fn join(&self, conn: ConnectionId, room: &str);

    /// Remove `conn` from `room`. Leaving a room the connection is not in is a no-op.
    fn leave(&self, conn: ConnectionId, room: &str);

    /// Current members of `room`, empty when the room does not exist.
    fn members(&self, room: &str) -> Vec<ConnectionId>;

    /// Rooms `conn` currently belongs to.
    fn rooms_of(&self, conn: ConnectionId) -> Vec<String>;

    /// Drop every membership held by `conn`.
    fn remove_all(&self, conn: ConnectionId);

    /// Names of all non-empty rooms.
    fn room_names(&self) -> Vec<String>;
}

/// In-process adapter keeping membership in memory.
#[derive(Debug, Default)]
pub struct LocalAdapter {
    rooms: DashMap<String, HashSet<ConnectionId>>,
}

impl LocalAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomAdapter for LocalAdapter {
    fn join(&self, conn: ConnectionId, room: &str) {
        self.rooms.entry(room.to_string()).or_default().insert(conn);
    }

    fn leave(&self, conn: ConnectionId, room: &str) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(&conn);
        }
        // re-checked under the shard lock so a concurrent join is never dropped
        self.rooms.remove_if(room, |_, members| members.is_empty());
    }

    fn members(&self, room: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    fn rooms_of(&self, conn: ConnectionId) -> Vec<String> {
        self.rooms
            .iter()
            .filter(|entry| entry.value().contains(&conn))
            .map(|entry| entry.key().clone())
            .collect()
    }

    fn remove_all(&self, conn: ConnectionId) {
        for room in self.rooms_of(conn) {
            self.leave(conn, &room);
        }
    }

    fn room_names(&self) -> Vec<String> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }
}

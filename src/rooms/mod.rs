pub mod adapter;
pub mod handler;
pub mod hub;

pub use adapter::{ConnectionId, LocalAdapter, RoomAdapter};
pub use handler::{DisconnectReason, RoomMembershipHandler};
pub use hub::ConnectionHub;

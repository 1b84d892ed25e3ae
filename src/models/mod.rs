pub mod message;
pub mod room;

pub use message::{ClientEvent, ServerEvent};
pub use room::{
    BroadcastRequest, BroadcastResponse, RoomDetailResponse, RoomListResponse, RoomSummary,
};

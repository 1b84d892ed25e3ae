use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rooms::ConnectionId;

#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BroadcastResponse {
    pub delivered: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoomSummary {
    pub name: String,
    pub member_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoomListResponse {
    pub rooms: Vec<RoomSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoomDetailResponse {
    pub name: String,
    pub members: Vec<ConnectionId>,
}

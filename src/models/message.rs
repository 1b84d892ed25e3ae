use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rooms::ConnectionId;

// Client to server events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "joinRoom")]
    JoinRoom(String),
    #[serde(rename = "outRoom")]
    OutRoom(String),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinRoom(_) => "joinRoom",
            ClientEvent::OutRoom(_) => "outRoom",
        }
    }
}

// Server to client events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEvent {
    pub event: String,
    pub data: Value,
}

impl ServerEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn connected(id: ConnectionId) -> Self {
        Self::new("connected", serde_json::json!({ "id": id }))
    }
}

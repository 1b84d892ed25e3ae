use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    models::{
        BroadcastRequest, BroadcastResponse, RoomDetailResponse, RoomListResponse, RoomSummary,
        ServerEvent,
    },
    pipeline::{FieldError, PipelineError},
    rooms::ConnectionHub,
};

pub struct ApiHandlers {
    hub: Arc<ConnectionHub>,
}

impl ApiHandlers {
    pub fn new(hub: Arc<ConnectionHub>) -> Self {
        Self { hub }
    }

    pub async fn list_rooms(
        State(handlers): State<Arc<Self>>,
    ) -> Result<Json<RoomListResponse>, PipelineError> {
        let adapter = handlers.hub.adapter();
        let mut rooms: Vec<RoomSummary> = adapter
            .room_names()
            .into_iter()
            .map(|name| RoomSummary {
                member_count: adapter.members(&name).len(),
                name,
            })
            .collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Json(RoomListResponse { rooms }))
    }

    pub async fn get_room(
        State(handlers): State<Arc<Self>>,
        Path(room): Path<String>,
    ) -> Result<Json<RoomDetailResponse>, PipelineError> {
        let members = handlers.hub.adapter().members(&room);
        if members.is_empty() {
            return Err(PipelineError::new(format!("Room '{}' has no members", room)).with_status(404));
        }

        Ok(Json(RoomDetailResponse { name: room, members }))
    }

    pub async fn broadcast(
        State(handlers): State<Arc<Self>>,
        Path(room): Path<String>,
        Json(request): Json<BroadcastRequest>,
    ) -> Result<Json<BroadcastResponse>, PipelineError> {
        if request.event.trim().is_empty() {
            return Err(PipelineError::validation(vec![FieldError::new(
                "event",
                "Event name is required",
            )]));
        }

        tracing::info!("📣 Broadcasting '{}' to room '{}'", request.event, room);
        let delivered = handlers
            .hub
            .broadcast(&room, ServerEvent::new(request.event, request.data));

        Ok(Json(BroadcastResponse { delivered }))
    }
}

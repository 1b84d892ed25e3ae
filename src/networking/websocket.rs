use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::{
    models::{ClientEvent, ServerEvent},
    rooms::{ConnectionHub, ConnectionId, DisconnectReason, RoomMembershipHandler},
};

pub struct WebSocketHandler {
    hub: Arc<ConnectionHub>,
    rooms: RoomMembershipHandler,
}

impl WebSocketHandler {
    pub fn new(hub: Arc<ConnectionHub>) -> Self {
        let rooms = RoomMembershipHandler::new(hub.adapter());
        Self { hub, rooms }
    }

    pub async fn handle_upgrade(
        State(handler): State<Arc<Self>>,
        ws: WebSocketUpgrade,
    ) -> Response {
        ws.on_upgrade(move |socket| handler.handle_socket(socket))
    }

    async fn handle_socket(self: Arc<Self>, socket: WebSocket) {
        let (mut sender, mut receiver) = socket.split();
        let conn = ConnectionId::new();
        let mut outbound = self.hub.register(conn);

        tracing::info!(
            "New connection {} ({} open)",
            conn,
            self.hub.connection_count()
        );
        self.hub.send_to(conn, ServerEvent::connected(conn));

        let writer = tokio::spawn(async move {
            while let Some(event) = outbound.recv().await {
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Failed to encode event '{}': {}", event.event, e);
                        continue;
                    }
                };
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        });

        let reason = loop {
            match receiver.next().await {
                Some(Ok(Message::Text(text))) => self.handle_text(conn, &text),
                Some(Ok(Message::Close(_))) => break DisconnectReason::ClientClosed,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!("WebSocket error on {}: {}", conn, e);
                    break DisconnectReason::TransportError(e.to_string());
                }
                None => break DisconnectReason::StreamEnded,
            }
        };

        self.rooms.on_disconnect(conn, &reason);
        self.hub.unregister(conn);
        writer.abort();
    }

    fn handle_text(&self, conn: ConnectionId, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => {
                tracing::trace!("Connection {} sent {}", conn, event.name());
                self.rooms.handle_event(conn, event);
            }
            Err(e) => tracing::warn!("Ignoring invalid frame from {}: {}", conn, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, server::Server};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_tungstenite::{connect_async, tungstenite};

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    #[test]
    fn test_text_frames_drive_membership() {
        let hub = Arc::new(ConnectionHub::with_local_adapter());
        let handler = WebSocketHandler::new(hub.clone());
        let conn = ConnectionId::new();
        let _rx = hub.register(conn);

        handler.handle_text(conn, r#"{"event":"joinRoom","data":"lobby"}"#);
        assert_eq!(hub.adapter().members("lobby"), vec![conn]);

        handler.handle_text(conn, "not json");
        handler.handle_text(conn, r#"{"event":"unknown","data":"lobby"}"#);
        assert_eq!(hub.adapter().members("lobby"), vec![conn]);

        handler.handle_text(conn, r#"{"event":"outRoom","data":"lobby"}"#);
        assert!(hub.adapter().members("lobby").is_empty());
    }

    #[tokio::test]
    async fn test_socket_session_over_ws_route() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Server::new(Config::default());
        let hub = server.hub();
        let app = server.router();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();

        let hello = match ws.next().await.unwrap().unwrap() {
            tungstenite::Message::Text(text) => serde_json::from_str::<serde_json::Value>(&text).unwrap(),
            other => panic!("unexpected frame {:?}", other),
        };
        assert_eq!(hello["event"], "connected");
        let conn: ConnectionId = serde_json::from_value(hello["data"]["id"].clone()).unwrap();
        assert!(hub.is_connected(conn));

        ws.send(tungstenite::Message::Text(
            r#"{"event":"joinRoom","data":"lobby"}"#.to_string(),
        ))
        .await
        .unwrap();
        wait_until(|| hub.adapter().members("lobby") == vec![conn]).await;

        ws.send(tungstenite::Message::Text(
            r#"{"event":"outRoom","data":"lobby"}"#.to_string(),
        ))
        .await
        .unwrap();
        wait_until(|| hub.adapter().members("lobby").is_empty()).await;

        ws.send(tungstenite::Message::Text(
            r#"{"event":"joinRoom","data":"lobby"}"#.to_string(),
        ))
        .await
        .unwrap();
        wait_until(|| hub.adapter().members("lobby") == vec![conn]).await;

        ws.close(None).await.unwrap();
        wait_until(|| !hub.is_connected(conn)).await;
        assert!(hub.adapter().members("lobby").is_empty());
        assert_eq!(hub.connection_count(), 0);
    }
}

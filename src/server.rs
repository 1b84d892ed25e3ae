use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::Config,
    handlers::ApiHandlers,
    networking::WebSocketHandler,
    pipeline::{error_pipeline, not_found_fallback, panic_to_error, ErrorPipeline},
    rooms::ConnectionHub,
    Result,
};

pub struct Server {
    config: Config,
    hub: Arc<ConnectionHub>,
    pipeline: Arc<ErrorPipeline>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        let hub = Arc::new(ConnectionHub::with_local_adapter());
        let pipeline = Arc::new(ErrorPipeline::for_environment(config.app.environment));

        info!(
            "Error pipeline for {}: {:?}",
            config.app.environment,
            pipeline.stage_names()
        );

        Self {
            config,
            hub,
            pipeline,
        }
    }

    pub fn hub(&self) -> Arc<ConnectionHub> {
        self.hub.clone()
    }

    pub fn router(&self) -> Router {
        let ws_handler = Arc::new(WebSocketHandler::new(self.hub.clone()));
        let api_handlers = Arc::new(ApiHandlers::new(self.hub.clone()));

        let ws_router = Router::new()
            .route("/ws", get(WebSocketHandler::handle_upgrade))
            .with_state(ws_handler);

        Router::new()
            .route("/health", get(|| async { "OK" }))
            .route("/api/rooms", get(ApiHandlers::list_rooms))
            .route("/api/rooms/:room", get(ApiHandlers::get_room))
            .route("/api/rooms/:room/broadcast", post(ApiHandlers::broadcast))
            .with_state(api_handlers)
            .merge(ws_router)
            .fallback(not_found_fallback)
            .layer(
                // outermost first; panics are caught inside the error pipeline
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive())
                    .layer(middleware::from_fn_with_state(
                        self.pipeline.clone(),
                        error_pipeline,
                    ))
                    .layer(CatchPanicLayer::custom(panic_to_error)),
            )
    }

    pub async fn run(self) -> Result<()> {
        let app = self.router();

        let http_addr = self.config.http_addr()?;
        info!("Starting HTTP server on {}", http_addr);

        let listener = TcpListener::bind(http_addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::sync::Arc;

use super::chain::ErrorPipeline;
use super::error::{PipelineError, RaisedError, RouteNotFound};
use super::stages::RequestInfo;

// framework rejections are short plain-text bodies
const REJECTION_BODY_LIMIT: usize = 64 * 1024;

/// Hosts the error pipeline around the router.
///
/// Responses flagged with [`RaisedError`] or [`RouteNotFound`] are replaced
/// by whatever the pipeline finalizes. Error responses built by the framework
/// itself (extractor rejections, unsupported methods) are turned into
/// pipeline errors too; a 405 is treated as an unmatched route.
pub async fn error_pipeline(
    State(pipeline): State<Arc<ErrorPipeline>>,
    request: Request,
    next: Next,
) -> Response {
    let info = RequestInfo::capture(&request);
    let mut response = next.run(request).await;

    if let Some(RaisedError(error)) = response.extensions_mut().remove::<RaisedError>() {
        return pipeline.handle_error(error, &info).into_response();
    }

    let status = response.status();
    if response.extensions().get::<RouteNotFound>().is_some()
        || status == StatusCode::METHOD_NOT_ALLOWED
    {
        return pipeline.handle_not_found(&info).into_response();
    }

    if status.is_client_error() || status.is_server_error() {
        let error = rejection_to_error(response).await;
        return pipeline.handle_error(error, &info).into_response();
    }

    response
}

async fn rejection_to_error(response: Response) -> PipelineError {
    let status = response.status();
    let text = match axum::body::to_bytes(response.into_body(), REJECTION_BODY_LIMIT).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(e) => {
            tracing::warn!("Could not read rejection body: {}", e);
            String::new()
        }
    };

    let message = if text.is_empty() {
        status.canonical_reason().unwrap_or("Unknown error").to_string()
    } else {
        text
    };

    tracing::debug!(status = status.as_u16(), "Framework rejection: {}", message);
    PipelineError::new(message).with_status(status.as_u16())
}

/// Router fallback for unmatched routes.
pub async fn not_found_fallback() -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    response.extensions_mut().insert(RouteNotFound);
    response
}

/// Turn a handler panic into a pipeline error.
pub fn panic_to_error(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!("Handler panicked: {}", detail);
    PipelineError::new(detail).into_response()
}

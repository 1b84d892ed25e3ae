use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

/// One failed field of a validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// An error travelling through the HTTP error pipeline.
///
/// Serializing it yields the raw object the production renderer exposes:
/// `message`, `status` when set and `errors` when set. The stack never leaves
/// the process through serialization.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip)]
    pub stack: Option<String>,
    #[serde(rename = "errors", skip_serializing_if = "Option::is_none")]
    pub validation: Option<Vec<FieldError>>,
}

impl PipelineError {
    /// Create an error, capturing a backtrace when `RUST_BACKTRACE` allows it.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let backtrace = Backtrace::capture();
        let stack = match backtrace.status() {
            BacktraceStatus::Captured => Some(format!("Error: {}\n{}", message, backtrace)),
            _ => None,
        };

        Self {
            message,
            status: None,
            stack,
            validation: None,
        }
    }

    pub fn not_found(path: &str) -> Self {
        Self::new(format!("Not found - {}", path)).with_status(404)
    }

    pub fn validation(fields: Vec<FieldError>) -> Self {
        let message = fields
            .iter()
            .map(|f| format!("{}: {}", f.field, f.message))
            .collect::<Vec<_>>()
            .join(", ");

        let mut error = Self::new(message);
        error.validation = Some(fields);
        error
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Status to answer with when the error does not declare one.
    pub fn status_or_500(&self) -> StatusCode {
        self.status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn has_validation(&self) -> bool {
        self.validation.as_ref().is_some_and(|fields| !fields.is_empty())
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PipelineError {}

impl From<crate::Error> for PipelineError {
    fn from(error: crate::Error) -> Self {
        Self::new(error.to_string())
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(format!("{:#}", error))
    }
}

/// Marker left in response extensions for the pipeline middleware.
#[derive(Debug, Clone)]
pub struct RaisedError(pub PipelineError);

/// Marker left by the router fallback when no route matched.
#[derive(Debug, Clone, Copy)]
pub struct RouteNotFound;

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        // placeholder; the pipeline middleware replaces it
        let mut response = self.status_or_500().into_response();
        response.extensions_mut().insert(RaisedError(self));
        response
    }
}

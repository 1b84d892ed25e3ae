use axum::{
    extract::Request,
    http::{header, StatusCode},
};
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use std::sync::OnceLock;

use super::error::PipelineError;
use super::negotiate::negotiate;
use super::response::ResponseSink;

/// Request facts the stages need, captured before the handler runs.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub path: String,
    pub accept: Option<String>,
    pub referer: Option<String>,
}

impl RequestInfo {
    pub fn capture(request: &Request) -> Self {
        let header_value = |name: header::HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let uri = request.uri();
        Self {
            path: uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| uri.path().to_string()),
            accept: header_value(header::ACCEPT),
            referer: header_value(header::REFERER),
        }
    }
}

/// Outcome of a stage.
#[derive(Debug)]
pub enum Flow {
    /// Hand the error to the next stage.
    Next(PipelineError),
    /// Stop the chain.
    Done,
}

pub trait ErrorStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn handle(&self, error: PipelineError, request: &RequestInfo, sink: &mut ResponseSink) -> Flow;
}

/// Entry stage for requests no route matched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotFound;

impl NotFound {
    /// Raise a 404 error, hand it to `next`, then redirect back to the
    /// referring page. The redirect only wins when nothing after it answered.
    pub fn handle<F>(&self, request: &RequestInfo, sink: &mut ResponseSink, next: F)
    where
        F: FnOnce(PipelineError, &mut ResponseSink),
    {
        let error = PipelineError::not_found(&request.path);
        sink.status(StatusCode::NOT_FOUND);
        tracing::debug!("{}", error.message);

        next(error, sink);
        sink.redirect_back(request.referer.as_deref());
    }
}

/// Answers 422 for errors carrying field validation messages.
///
/// One body is emitted per failing field; only the first reaches the client.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValidationErrors;

impl ErrorStage for ValidationErrors {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn handle(&self, error: PipelineError, _request: &RequestInfo, sink: &mut ResponseSink) -> Flow {
        if !error.has_validation() {
            return Flow::Next(error);
        }

        for field in error.validation.unwrap_or_default() {
            sink.status(StatusCode::UNPROCESSABLE_ENTITY);
            sink.json(json!({
                "status": "Unprocessable Entity",
                "error": field.message,
            }));
        }
        Flow::Done
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetails {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(rename = "stackHighlighted")]
    pub stack_highlighted: String,
    #[serde(skip)]
    stack: String,
}

fn stack_location() -> &'static Regex {
    static LOCATION: OnceLock<Regex> = OnceLock::new();
    LOCATION.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9_\-./\\]+\.[A-Za-z]+:\d+(?::\d+)?").expect("stack location pattern is valid")
    })
}

/// Wrap every `file.ext:line` or `file.ext:line:col` in `<mark>` tags.
pub fn highlight_stack(stack: &str) -> String {
    stack_location().replace_all(stack, "<mark>$0</mark>").into_owned()
}

type Render = fn(&ErrorDetails, StatusCode, &mut ResponseSink);

fn render_html(details: &ErrorDetails, status: StatusCode, sink: &mut ResponseSink) {
    let stack = highlight_stack(&html_escape::encode_text(&details.stack));
    sink.html(format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Error {code}</title></head>\n<body>\n\
         <h2>{message}</h2>\n<h3>{code}</h3>\n<pre>{stack}</pre>\n</body>\n</html>\n",
        code = status.as_u16(),
        message = html_escape::encode_text(&details.message),
        stack = stack,
    ));
}

fn render_json(details: &ErrorDetails, _status: StatusCode, sink: &mut ResponseSink) {
    sink.json(json!({ "error": details }));
}

const DEVELOPMENT_FORMATS: [(&str, Render); 2] = [
    ("text/html", render_html),
    ("application/json", render_json),
];

impl ErrorDetails {
    fn from_error(error: &PipelineError) -> Self {
        let stack = error.stack.clone().unwrap_or_default();
        Self {
            message: error.message.clone(),
            status: error.status,
            stack_highlighted: highlight_stack(&stack),
            stack,
        }
    }
}

/// Verbose renderer for non-production deployments.
#[derive(Debug, Default, Clone, Copy)]
pub struct DevelopmentErrors;

impl ErrorStage for DevelopmentErrors {
    fn name(&self) -> &'static str {
        "development"
    }

    fn handle(&self, error: PipelineError, request: &RequestInfo, sink: &mut ResponseSink) -> Flow {
        let status = error.status_or_500();
        let details = ErrorDetails::from_error(&error);
        sink.status(status);

        tracing::error!(status = status.as_u16(), "{}", error.message);

        match negotiate(request.accept.as_deref(), &DEVELOPMENT_FORMATS) {
            Some((_, render)) => {
                render(&details, status, sink);
                Flow::Next(error)
            }
            None => Flow::Next(PipelineError::new("Not Acceptable").with_status(406)),
        }
    }
}

/// Production renderer: always 500, exposes the raw error object.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductionErrors;

impl ErrorStage for ProductionErrors {
    fn name(&self) -> &'static str {
        "production"
    }

    fn handle(&self, error: PipelineError, _request: &RequestInfo, sink: &mut ResponseSink) -> Flow {
        tracing::error!(status = ?error.status, "{}", error.message);

        sink.status(StatusCode::INTERNAL_SERVER_ERROR);
        sink.json(json!({ "error": error }));
        Flow::Next(error)
    }
}

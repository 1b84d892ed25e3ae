use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Html(String),
    Text(String),
}

/// One attempt by a stage to finalize the response.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Body,
    /// False when an earlier emission already finalized the response.
    pub accepted: bool,
}

impl Emission {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            Body::Json(value) => (self.status, Json(value)).into_response(),
            Body::Html(html) => (self.status, Html(html)).into_response(),
            Body::Text(text) => (self.status, text).into_response(),
        };

        if let Some(location) = self.location {
            if let Ok(value) = location.parse() {
                response.headers_mut().insert(header::LOCATION, value);
            }
        }
        response
    }
}

/// Per-request response target shared by the pipeline stages.
///
/// The first emission finalizes the response. Every later attempt is kept
/// for inspection but never reaches the client.
#[derive(Debug)]
pub struct ResponseSink {
    status: StatusCode,
    emissions: Vec<Emission>,
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            emissions: Vec::new(),
        }
    }

    /// Set the status used by the next emission.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn pending_status(&self) -> StatusCode {
        self.status
    }

    pub fn json(&mut self, value: Value) {
        self.emit(Body::Json(value), None);
    }

    pub fn html(&mut self, html: impl Into<String>) {
        self.emit(Body::Html(html.into()), None);
    }

    pub fn text(&mut self, text: impl Into<String>) {
        self.emit(Body::Text(text.into()), None);
    }

    /// Redirect to the referring page, or `/` without one.
    pub fn redirect_back(&mut self, referer: Option<&str>) {
        let location = referer.unwrap_or("/").to_string();
        self.status(StatusCode::FOUND);
        self.emit(
            Body::Text(format!("Found. Redirecting to {}", location)),
            Some(location),
        );
    }

    pub fn is_finalized(&self) -> bool {
        self.emissions.iter().any(|e| e.accepted)
    }

    pub fn emissions(&self) -> &[Emission] {
        &self.emissions
    }

    /// The emission the client actually receives.
    pub fn finalized(&self) -> Option<&Emission> {
        self.emissions.iter().find(|e| e.accepted)
    }

    fn emit(&mut self, body: Body, location: Option<String>) {
        let accepted = !self.is_finalized();
        if !accepted {
            tracing::warn!(
                status = self.status.as_u16(),
                "Response already sent, discarding emission"
            );
        }

        self.emissions.push(Emission {
            status: self.status,
            location,
            body,
            accepted,
        });
    }
}

impl IntoResponse for ResponseSink {
    fn into_response(self) -> Response {
        match self.emissions.into_iter().find(|e| e.accepted) {
            Some(emission) => emission.into_response(),
            None => {
                tracing::error!("Error pipeline finished without a response");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_write_wins() {
        let mut sink = ResponseSink::new();
        sink.status(StatusCode::UNPROCESSABLE_ENTITY);
        sink.json(json!({"error": "first"}));
        sink.status(StatusCode::BAD_REQUEST);
        sink.json(json!({"error": "second"}));

        assert_eq!(sink.emissions().len(), 2);
        assert!(!sink.emissions()[1].accepted);

        let finalized = sink.finalized().unwrap();
        assert_eq!(finalized.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(finalized.body, Body::Json(json!({"error": "first"})));
    }

    #[test]
    fn test_redirect_back() {
        let mut sink = ResponseSink::new();
        sink.redirect_back(Some("/previous"));

        let response = sink.into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/previous");
    }

    #[test]
    fn test_redirect_without_referer() {
        let mut sink = ResponseSink::new();
        sink.redirect_back(None);
        assert_eq!(sink.finalized().unwrap().location.as_deref(), Some("/"));
    }

    #[test]
    fn test_empty_sink_renders_500() {
        let sink = ResponseSink::new();
        assert!(!sink.is_finalized());
        assert_eq!(sink.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

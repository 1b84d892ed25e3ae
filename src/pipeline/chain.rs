use axum::http::StatusCode;

use super::error::PipelineError;
use super::response::ResponseSink;
use super::stages::{
    DevelopmentErrors, ErrorStage, Flow, NotFound, ProductionErrors, RequestInfo, ValidationErrors,
};
use crate::config::Environment;

/// Ordered chain of error stages.
pub struct ErrorPipeline {
    not_found: NotFound,
    stages: Vec<Box<dyn ErrorStage>>,
}

impl Default for ErrorPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorPipeline {
    pub fn new() -> Self {
        Self {
            not_found: NotFound,
            stages: Vec::new(),
        }
    }

    pub fn stage(mut self, stage: impl ErrorStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Validation stage followed by the renderer for `environment`.
    pub fn for_environment(environment: Environment) -> Self {
        let pipeline = Self::new().stage(ValidationErrors);
        match environment {
            Environment::Development => pipeline.stage(DevelopmentErrors),
            Environment::Production => pipeline.stage(ProductionErrors),
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run `error` through every stage until one stops the chain.
    pub fn run(&self, error: PipelineError, request: &RequestInfo, sink: &mut ResponseSink) {
        let mut error = error;
        for stage in &self.stages {
            match stage.handle(error, request, sink) {
                Flow::Next(next) => error = next,
                Flow::Done => return,
            }
        }

        if !sink.is_finalized() {
            let status = error.status_or_500();
            tracing::warn!(status = status.as_u16(), "No stage answered, using default response");
            sink.status(status);
            sink.text(status.canonical_reason().unwrap_or("Internal Server Error"));
        }
    }

    pub fn handle_error(&self, error: PipelineError, request: &RequestInfo) -> ResponseSink {
        let mut sink = ResponseSink::new();
        self.run(error, request, &mut sink);
        sink
    }

    pub fn handle_not_found(&self, request: &RequestInfo) -> ResponseSink {
        let mut sink = ResponseSink::new();
        self.not_found
            .handle(request, &mut sink, |error, sink| self.run(error, request, sink));
        sink
    }
}

impl From<Environment> for ErrorPipeline {
    fn from(environment: Environment) -> Self {
        Self::for_environment(environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::error::FieldError;
    use crate::pipeline::response::Body;
    use serde_json::json;

    fn request(path: &str, accept: &str) -> RequestInfo {
        RequestInfo {
            path: path.to_string(),
            accept: Some(accept.to_string()),
            referer: Some("/back".to_string()),
        }
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(
            ErrorPipeline::for_environment(Environment::Development).stage_names(),
            vec!["validation", "development"]
        );
        assert_eq!(
            ErrorPipeline::from(Environment::Production).stage_names(),
            vec!["validation", "production"]
        );
    }

    #[test]
    fn test_not_found_in_development() {
        let pipeline = ErrorPipeline::for_environment(Environment::Development);
        let sink = pipeline.handle_not_found(&request("/missing", "application/json"));

        let emissions = sink.emissions();
        assert_eq!(emissions.len(), 2);

        let finalized = sink.finalized().unwrap();
        assert_eq!(finalized.status, StatusCode::NOT_FOUND);
        match &finalized.body {
            Body::Json(body) => assert_eq!(body["error"]["message"], "Not found - /missing"),
            other => panic!("expected json, got {:?}", other),
        }

        // the trailing redirect is recorded but discarded
        assert_eq!(emissions[1].status, StatusCode::FOUND);
        assert!(!emissions[1].accepted);
    }

    #[test]
    fn test_not_found_in_production() {
        let pipeline = ErrorPipeline::for_environment(Environment::Production);
        let sink = pipeline.handle_not_found(&request("/missing", "application/json"));

        let finalized = sink.finalized().unwrap();
        assert_eq!(finalized.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            finalized.body,
            Body::Json(json!({"error": {"message": "Not found - /missing", "status": 404}}))
        );
    }

    #[test]
    fn test_validation_stops_chain() {
        let pipeline = ErrorPipeline::for_environment(Environment::Production);
        let error = PipelineError::validation(vec![
            FieldError::new("email", "invalid"),
            FieldError::new("age", "required"),
        ]);

        let sink = pipeline.handle_error(error, &request("/signup", "application/json"));
        assert_eq!(sink.emissions().len(), 2);

        let finalized = sink.finalized().unwrap();
        assert_eq!(finalized.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            finalized.body,
            Body::Json(json!({"status": "Unprocessable Entity", "error": "invalid"}))
        );
    }

    #[test]
    fn test_default_response_without_renderer() {
        let pipeline = ErrorPipeline::new().stage(ValidationErrors);
        let sink = pipeline.handle_error(PipelineError::new("boom").with_status(503), &request("/", "*/*"));

        let finalized = sink.finalized().unwrap();
        assert_eq!(finalized.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(finalized.body, Body::Text("Service Unavailable".to_string()));
    }

    #[test]
    fn test_not_acceptable_falls_through() {
        let pipeline = ErrorPipeline::for_environment(Environment::Development);
        let sink = pipeline.handle_error(PipelineError::new("boom"), &request("/", "image/png"));

        let finalized = sink.finalized().unwrap();
        assert_eq!(finalized.status, StatusCode::NOT_ACCEPTABLE);
    }
}

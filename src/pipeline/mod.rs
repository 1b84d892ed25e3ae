//! HTTP error pipeline.
//!
//! Handlers raise [`PipelineError`]s (or hit the router fallback); the
//! [`error_pipeline`] middleware then runs the ordered stages of an
//! [`ErrorPipeline`] against a per-request [`ResponseSink`]:
//! not-found, validation, then the development or production renderer.

pub mod chain;
pub mod error;
pub mod layer;
pub mod negotiate;
pub mod response;
pub mod stages;

pub use chain::ErrorPipeline;
pub use error::{FieldError, PipelineError, RaisedError, RouteNotFound};
pub use layer::{error_pipeline, not_found_fallback, panic_to_error};
pub use response::{Body, Emission, ResponseSink};
pub use stages::{
    DevelopmentErrors, ErrorStage, Flow, NotFound, ProductionErrors, RequestInfo, ValidationErrors,
};

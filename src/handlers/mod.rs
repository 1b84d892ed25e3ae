pub mod api;

pub use api::ApiHandlers;

pub mod config;
pub mod server;
pub mod models;
pub mod handlers;
pub mod networking;
pub mod pipeline;
pub mod rooms;
pub mod error;

pub use error::{Error, Result};

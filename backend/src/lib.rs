//! HTTP API for the task list: routing, persistence and hosting adapters.

pub mod config;
pub mod error;
pub mod invoke;
pub mod routes;
pub mod store;
pub mod telemetry;

pub use config::AppConfig;
pub use error::ApiError;
pub use routes::{build_router, AppState};

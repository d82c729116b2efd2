//! HTTP surface of the SamaCarnet backend.
//!
//! Thin axum layer over `samacarnet_core`: handlers translate headers and
//! JSON bodies into service calls and map domain errors to the public
//! `{ success, message }` envelope.

pub mod api;
pub mod config;

pub use api::router::build_router;
pub use api::state::AppState;
pub use config::{ConfigError, ServerConfig};

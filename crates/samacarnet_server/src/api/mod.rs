//! Router, shared state, error mapping and endpoint handlers.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod state;

//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own multi-statement units of work (transactions) so callers never
//!   see a half-applied transition.

pub mod auth_service;
pub mod patient_service;
pub mod qr_code_service;
pub mod taxonomy_service;
pub mod visit_service;

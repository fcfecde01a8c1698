//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate registry calls into use-case level APIs.
//! - Keep front-end layers decoupled from snapshot storage details.

pub mod record_service;

//! REST client library for the malware analysis backend.
//!
//! Provides the HTTP wrapper ([`api::AnalysisApi`]) for task creation,
//! status polling and report retrieval, plus the [`AnalysisBackend`]
//! trait the orchestrator is written against.

pub mod api;
pub mod backend;

pub use api::{AnalysisApi, AnalysisApiError};
pub use backend::AnalysisBackend;

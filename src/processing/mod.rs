//! # Processing Module
//!
//! This module contains the per-format adaptation pipeline orchestration.

pub mod orchestrator;

// Re-export commonly used types for convenience
pub use orchestrator::{
    AdaptationReport, AdaptationResult, FailureRecord, Orchestrator, PROGRESS_DONE,
    PROGRESS_STARTED,
};

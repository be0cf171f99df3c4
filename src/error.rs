//! # Error Handling
//!
//! Error taxonomy for the adaptation engine and its classification helpers.
//!
//! ## Taxonomy
//!
//! - `InvalidDimensions`: non-positive source or target size; fatal to one format only
//! - `Render`: canvas allocation, scaling or encoding failure; fatal to one format only
//! - `UpstreamAnalysisUnavailable`: the vision backend failed or returned nothing usable;
//!   the analyzer degrades to defaults instead of surfacing it
//! - `Config`, `Io`, `Decode`: configuration and CLI-edge failures
//!
//! ## Propagation
//!
//! Format-scoped errors are captured per format inside the orchestrator's report and
//! are never raised as a whole-batch failure. See [`classify`] for the helpers the
//! orchestrator and CLI use to decide what to do with an error.
//!
//! ## Usage
//!
//! ```rust
//! use ad_format_adapter::error::{AdaptError, ErrorKind};
//!
//! let error = AdaptError::invalid_dimensions("source", 0, 480);
//! assert_eq!(error.kind(), ErrorKind::InvalidDimensions);
//! assert!(error.is_format_scoped());
//! ```

use std::fmt;

use adfmt_scale::presets::PlanError;
use serde::Serialize;
use thiserror::Error;

/// Coarse error category, as reported in per-format failure records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidDimensions,
    RenderError,
    UpstreamAnalysisUnavailable,
    Config,
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidDimensions => "invalid_dimensions",
            ErrorKind::RenderError => "render_error",
            ErrorKind::UpstreamAnalysisUnavailable => "upstream_analysis_unavailable",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base error type for the adaptation engine.
#[derive(Debug, Error)]
pub enum AdaptError {
    /// A source or target side is zero.
    #[error("Invalid {subject} dimensions {width}x{height}: both sides must be positive")]
    InvalidDimensions {
        subject: String,
        width: u32,
        height: u32,
    },

    /// Canvas allocation, region scaling or encoding failed.
    #[error("Render failed during {stage}: {reason}")]
    Render { stage: String, reason: String },

    /// The external detector or classifier failed or returned nothing usable.
    #[error("Upstream analysis unavailable from {backend}: {reason}")]
    UpstreamAnalysisUnavailable { backend: String, reason: String },

    /// Configuration validation errors.
    #[error("Configuration error in '{field}': {reason}")]
    Config { field: String, reason: String },

    /// I/O errors at the CLI or config-loading edge.
    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Image or JSON decoding errors at the edge.
    #[error("Failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },
}

/// Result type alias using the engine's error type
pub type AdaptResult<T> = Result<T, AdaptError>;

impl AdaptError {
    /// Create an invalid-dimensions error
    pub fn invalid_dimensions(subject: impl Into<String>, width: u32, height: u32) -> Self {
        Self::InvalidDimensions {
            subject: subject.into(),
            width,
            height,
        }
    }

    /// Create a render error
    pub fn render(stage: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Render {
            stage: stage.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an upstream-analysis error
    pub fn upstream(backend: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::UpstreamAnalysisUnavailable {
            backend: backend.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a decode error
    pub fn decode(what: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Decode {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDimensions { .. } => ErrorKind::InvalidDimensions,
            Self::Render { .. } => ErrorKind::RenderError,
            Self::UpstreamAnalysisUnavailable { .. } => ErrorKind::UpstreamAnalysisUnavailable,
            Self::Config { .. } => ErrorKind::Config,
            Self::Io { .. } | Self::Decode { .. } => ErrorKind::Io,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Errors that only invalidate the format being rendered, never its siblings.
    pub fn is_format_scoped(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidDimensions | ErrorKind::RenderError
        )
    }
}

impl From<PlanError> for AdaptError {
    fn from(error: PlanError) -> Self {
        match error {
            PlanError::EmptySource(s) => Self::invalid_dimensions("source", s.w, s.h),
            PlanError::EmptyTarget(s) => Self::invalid_dimensions("target", s.w, s.h),
        }
    }
}

impl From<adfmt_scale::cpu::ScaleError> for AdaptError {
    fn from(error: adfmt_scale::cpu::ScaleError) -> Self {
        Self::render("scale", error)
    }
}

impl From<image::ImageError> for AdaptError {
    fn from(error: image::ImageError) -> Self {
        match error {
            image::ImageError::Encoding(e) => Self::render("encode", e),
            image::ImageError::Limits(e) => Self::render("allocate", e),
            other => Self::decode("image", other),
        }
    }
}

impl From<serde_json::Error> for AdaptError {
    fn from(error: serde_json::Error) -> Self {
        Self::decode("json", error)
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// The pipeline keeps going with defaults when this happens.
    pub fn is_degradable(error: &AdaptError) -> bool {
        error.kind() == ErrorKind::UpstreamAnalysisUnavailable
    }

    /// Errors that stop the CLI before any format is rendered.
    pub fn is_fatal(error: &AdaptError) -> bool {
        matches!(error.kind(), ErrorKind::Config | ErrorKind::Io)
    }
}

//! # Analysis Module
//!
//! Content analysis of the source advertisement: the immutable data model, the
//! vision backend capability and the analyzer that ties them together.

pub mod analyzer;
pub mod backend;
pub mod model;

pub use analyzer::ContentAnalyzer;
pub use backend::{
    Classification, Device, DevicePolicy, StaticBackend, StaticDetections, UnavailableBackend,
    VisionBackend,
};
pub use model::{AnalysisResult, BoundingBox, Color, DetectedObject, Style};

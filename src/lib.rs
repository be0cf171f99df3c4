//! # Ad Format Adapter Library
//!
//! Adapts one source advertisement into a catalog of fixed-size ad formats,
//! placing, scaling, cropping and annotating it according to a content
//! analysis so the result looks composed rather than stretched.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `analysis`: analysis data model, vision backend capability and analyzer
//! - `color`: dominant color sampling
//! - `catalog`: the output format catalog
//! - `placement`: aspect-ratio classes and placement plans (geometry in `adfmt-scale`)
//! - `render`: compositor, headline text and the interchangeable renderers
//! - `processing`: per-format orchestration with progress and failure isolation
//! - `config`: configuration management and validation
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ad_format_adapter::analysis::UnavailableBackend;
//! use ad_format_adapter::config::AdapterConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = image::open("ad.png")?.to_rgba8();
//! let config = AdapterConfig::default();
//!
//! let report = ad_format_adapter::adapt_image(
//!     Arc::new(source),
//!     UnavailableBackend::default(),
//!     &config,
//!     |name, percent| println!("{name}: {percent}%"),
//! )
//! .await?;
//!
//! for (key, image) in report.successes() {
//!     std::fs::write(format!("{key}.png"), &image.png)?;
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use image::RgbaImage;

use crate::config::AdapterConfig;

pub mod analysis;
pub mod catalog;
pub mod color;
pub mod config;
pub mod error;
pub mod placement;
pub mod processing;
pub mod render;

/// Re-export error types for convenience
pub use error::{AdaptError, AdaptResult, ErrorKind};

pub use analysis::{AnalysisResult, ContentAnalyzer, VisionBackend};
pub use catalog::{FormatCatalog, FormatSpec};
pub use processing::{AdaptationReport, AdaptationResult, Orchestrator};
pub use render::{EncodedImage, FormatRenderer, RendererKind};

/// Analyze `source` with `backend`, then adapt it into every format of the
/// configured catalog.
///
/// Analysis failures degrade instead of failing; the only errors returned are
/// configuration problems (for example an unreadable font).
pub async fn adapt_image<B, F>(
    source: Arc<RgbaImage>,
    backend: B,
    config: &AdapterConfig,
    on_progress: F,
) -> AdaptResult<AdaptationReport>
where
    B: VisionBackend,
    F: Fn(&str, u8) + Sync,
{
    let orchestrator = Orchestrator::from_config(config)?;
    let mut analyzer = ContentAnalyzer::new(backend, config.device, config.sampler);
    let analysis = Arc::new(analyzer.analyze(&source).await);

    Ok(orchestrator
        .adapt_all(source, analysis, config.catalog(), on_progress)
        .await)
}

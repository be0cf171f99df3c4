//! # Render Module
//!
//! Renderers turn (source, analysis, format) into an encoded output image.
//!
//! - [`CompositeRenderer`]: placement plan plus compositing of the source pixels
//! - [`GenerativeRenderer`]: prompt built from the analysis, image from an [`ImageGenerator`]
//!
//! Which one runs is a configuration choice ([`RendererKind`]); the orchestrator
//! only sees the [`FormatRenderer`] trait.

pub mod compositor;
pub mod generative;
pub mod text;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::analysis::model::AnalysisResult;
use crate::catalog::FormatSpec;
use crate::config::AdapterConfig;
use crate::error::{AdaptError, AdaptResult};

pub use compositor::Compositor;
pub use generative::{GenerativeRenderer, ImageGenerator, PlaceholderGenerator, build_prompt};
pub use text::TextPainter;

/// A PNG-encoded output format.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Catalog key, e.g. `format600x500`.
    pub key: String,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("key", &self.key)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_bytes", &self.png.len())
            .finish()
    }
}

impl EncodedImage {
    pub fn new(format: &FormatSpec, png: Vec<u8>) -> Self {
        Self {
            key: format.key(),
            width: format.width,
            height: format.height,
            png,
        }
    }

    /// `data:image/png;base64,...` form, as consumed by browsers.
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(&self.png))
    }

    pub fn decode(&self) -> AdaptResult<RgbaImage> {
        Ok(image::load_from_memory_with_format(&self.png, ImageFormat::Png)?.to_rgba8())
    }
}

/// Renders one output format.
pub trait FormatRenderer: Send + Sync {
    fn name(&self) -> &'static str;

    fn render(
        &self,
        source: &RgbaImage,
        analysis: &AnalysisResult,
        format: &FormatSpec,
    ) -> AdaptResult<EncodedImage>;
}

/// Places the source pixels according to the aspect-ratio class of the format.
#[derive(Debug, Default)]
pub struct CompositeRenderer {
    compositor: Compositor,
}

impl CompositeRenderer {
    pub fn new(compositor: Compositor) -> Self {
        Self { compositor }
    }
}

impl FormatRenderer for CompositeRenderer {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn render(
        &self,
        source: &RgbaImage,
        analysis: &AnalysisResult,
        format: &FormatSpec,
    ) -> AdaptResult<EncodedImage> {
        self.compositor.render(source, analysis, format)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    #[default]
    Composite,
    Generative,
}

impl RendererKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RendererKind::Composite => "composite",
            RendererKind::Generative => "generative",
        }
    }
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RendererKind {
    type Err = AdaptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "composite" => Ok(RendererKind::Composite),
            "generative" => Ok(RendererKind::Generative),
            other => Err(AdaptError::config(
                "renderer",
                format!("unknown renderer '{}', expected composite or generative", other),
            )),
        }
    }
}

/// Build the renderer selected by `config.renderer`.
pub fn build_renderer(config: &AdapterConfig) -> AdaptResult<Arc<dyn FormatRenderer>> {
    let renderer: Arc<dyn FormatRenderer> = match config.renderer {
        RendererKind::Composite => Arc::new(CompositeRenderer::new(Compositor::from_config(config)?)),
        RendererKind::Generative => Arc::new(GenerativeRenderer::new(PlaceholderGenerator::new(
            TextPainter::from_config(&config.overlay)?,
        ))),
    };
    Ok(renderer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_kind_parse() {
        assert_eq!("Generative".parse::<RendererKind>().unwrap(), RendererKind::Generative);
        assert_eq!("composite".parse::<RendererKind>().unwrap(), RendererKind::Composite);
        assert!("magic".parse::<RendererKind>().is_err());
    }

    #[test]
    fn test_build_renderer_follows_config() {
        let mut config = AdapterConfig::default();
        assert_eq!(build_renderer(&config).unwrap().name(), "composite");
        config.renderer = RendererKind::Generative;
        assert_eq!(build_renderer(&config).unwrap().name(), "generative");
    }

    #[test]
    fn test_data_url() {
        let encoded = EncodedImage::new(&FormatSpec::new(1, 1, "px"), vec![1, 2, 3]);
        assert_eq!(encoded.to_data_url(), "data:image/png;base64,AQID");
    }
}

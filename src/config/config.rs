//! # Configuration Module
//!
//! Configuration structures and validation for the adaptation engine. Shared by
//! the `adfmt` CLI and library callers.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Default | Description |
//! |-----------|------|---------|-------------|
//! | `sampler` | [`SamplerConfig`] | 5 colors, 100px, stride 10 | Dominant color sampling |
//! | `overlay` | [`OverlayConfig`] | see below | Headline text overlay |
//! | `thresholds` | [`ClassThresholds`] | 4.0 / 1.5 / 4.0 | Aspect-ratio class boundaries |
//! | `renderer` | [`RendererKind`] | `composite` | Which format renderer runs |
//! | `max_concurrency` | `usize` | available cores | Formats rendered at once |
//! | `device` | [`DevicePolicy`] | GPU, CPU fallback | Vision backend device |
//! | `catalog` | `Option<FormatCatalog>` | built-in | Output formats |
//!
//! ## Examples
//!
//! ```rust
//! use ad_format_adapter::config::AdapterConfig;
//!
//! let config = AdapterConfig::from_json_str(r#"{"renderer": "generative", "max_concurrency": 2}"#)
//!     .unwrap();
//! assert_eq!(config.max_concurrency, 2);
//! assert_eq!(config.overlay.max_font_px, 24);
//! assert!(config.validate().is_ok());
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::backend::DevicePolicy;
use crate::catalog::FormatCatalog;
use crate::color::SamplerConfig;
use crate::error::{AdaptError, AdaptResult};
use crate::placement::ClassThresholds;
use crate::render::RendererKind;

/// Rules for the optional bottom-centered headline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Canvases at or below this height never get text.
    pub min_height: u32,
    /// Upper bound on the font size in pixels.
    pub max_font_px: u32,
    /// Font size is `height / height_divisor`, capped at `max_font_px`.
    pub height_divisor: u32,
    /// Text measuring at least this fraction of the canvas width is dropped.
    pub max_width_ratio: f64,
    /// Distance from the baseline to the bottom edge.
    pub bottom_margin: u32,
    /// Opacity of the black text.
    pub opacity: f64,
    /// TrueType font to draw with; the built-in bitmap face is used when unset.
    pub font_path: Option<PathBuf>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            min_height: 100,
            max_font_px: 24,
            height_divisor: 10,
            max_width_ratio: 0.8,
            bottom_margin: 20,
            opacity: 0.7,
            font_path: None,
        }
    }
}

impl OverlayConfig {
    /// Font size in pixels for a canvas of the given height.
    pub fn font_px(&self, canvas_height: u32) -> u32 {
        (canvas_height / self.height_divisor.max(1)).min(self.max_font_px)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.height_divisor == 0 {
            return Err("overlay.height_divisor must be greater than 0".to_string());
        }
        if self.max_font_px == 0 {
            return Err("overlay.max_font_px must be greater than 0".to_string());
        }
        if !(self.max_width_ratio > 0.0 && self.max_width_ratio <= 1.0) {
            return Err(format!(
                "overlay.max_width_ratio must be in (0, 1], got {}",
                self.max_width_ratio
            ));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(format!("overlay.opacity must be in [0, 1], got {}", self.opacity));
        }
        Ok(())
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub sampler: SamplerConfig,
    pub overlay: OverlayConfig,
    pub thresholds: ClassThresholds,
    pub renderer: RendererKind,
    /// Formats rendered concurrently. Zero is rejected by [`validate`](Self::validate).
    pub max_concurrency: usize,
    pub device: DevicePolicy,
    /// Replaces the built-in catalog when set.
    pub catalog: Option<FormatCatalog>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            overlay: OverlayConfig::default(),
            thresholds: ClassThresholds::default(),
            renderer: RendererKind::default(),
            max_concurrency: default_concurrency(),
            device: DevicePolicy::default(),
            catalog: None,
        }
    }
}

/// Available cores, or 1 when that cannot be determined.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl AdapterConfig {
    pub fn from_json_str(json: &str) -> AdaptResult<Self> {
        let config: AdapterConfig = serde_json::from_str(json)?;
        config.validate().map_err(|e| AdaptError::config("config", e))?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> AdaptResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| AdaptError::io(format!("reading config {}", path.display()), e))?;
        Self::from_json_str(&json)
    }

    /// Validates the configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or an error message describing
    /// the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        self.sampler.validate()?;
        self.overlay.validate()?;
        self.thresholds.validate()?;
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Configured catalog, or the built-in one.
    pub fn catalog(&self) -> &FormatCatalog {
        self.catalog.as_ref().unwrap_or_else(|| FormatCatalog::builtin())
    }
}

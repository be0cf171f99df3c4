//! # Compositor
//!
//! Produces one output format from the source image, the analysis and a
//! placement plan. The steps always run in this order:
//!
//! 1. allocate a `W×H` RGBA canvas
//! 2. fill it with the dominant color (white when there is none)
//! 3. scale `source_rect` into `dest_rect` and composite it over the background
//! 4. draw the headline, if the overlay rules allow it
//! 5. encode losslessly as PNG
//!
//! Nothing outside `dest_rect` is touched by step 3.

use std::io::Cursor;

use adfmt_scale::cpu::{patch_len, scale_region_rgba};
use fast_image_resize::Resizer;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::imageops;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use tracing::debug;

use crate::analysis::model::AnalysisResult;
use crate::catalog::FormatSpec;
use crate::config::{AdapterConfig, OverlayConfig};
use crate::error::{AdaptError, AdaptResult};
use crate::placement::{self, ClassThresholds, PlacementPlan, Size};
use crate::render::EncodedImage;
use crate::render::text::{TextPainter, draw_headline};

/// Largest canvas side the compositor will allocate.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Zeroed RGBA8 buffer for a `width×height` raster, reserved fallibly.
fn pixel_buffer(stage: &str, width: u32, height: u32) -> AdaptResult<Vec<u8>> {
    if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
        return Err(AdaptError::render(
            stage,
            format!(
                "{}x{} exceeds the {}px side limit",
                width, height, MAX_CANVAS_SIDE
            ),
        ));
    }
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| AdaptError::render(stage, format!("{}x{} overflows", width, height)))?;

    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|e| {
        AdaptError::render(stage, format!("cannot allocate {}x{}: {}", width, height, e))
    })?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Allocate a canvas filled with `background`. Oversized or unallocatable
/// canvases are a render error, never an abort.
pub fn allocate_canvas(width: u32, height: u32, background: Rgba<u8>) -> AdaptResult<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(AdaptError::invalid_dimensions("target", width, height));
    }
    let mut buf = pixel_buffer("allocate", width, height)?;
    for px in buf.chunks_exact_mut(4) {
        px.copy_from_slice(&background.0);
    }
    RgbaImage::from_raw(width, height, buf)
        .ok_or_else(|| AdaptError::render("allocate", "canvas buffer does not match size"))
}

/// Scale the plan's source region and composite it onto `canvas` at `dest_rect`.
pub fn blit(canvas: &mut RgbaImage, source: &RgbaImage, plan: &PlacementPlan) -> AdaptResult<()> {
    let dest = plan.dest_rect;
    let mut patch = pixel_buffer("blit", dest.w, dest.h)?;
    debug_assert_eq!(patch.len(), patch_len(plan));
    let mut resizer = Resizer::new();
    let (sw, sh) = source.dimensions();
    scale_region_rgba(&mut resizer, source.as_raw(), Size::new(sw, sh), plan, &mut patch)?;

    let patch = RgbaImage::from_raw(dest.w, dest.h, patch)
        .ok_or_else(|| AdaptError::render("blit", "patch buffer does not match destination"))?;
    imageops::overlay(canvas, &patch, dest.x as i64, dest.y as i64);
    Ok(())
}

/// Lossless PNG with the strongest compression.
pub fn encode_png(canvas: &RgbaImage) -> AdaptResult<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    let encoder =
        PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, FilterType::Adaptive);
    encoder.write_image(
        canvas.as_raw(),
        canvas.width(),
        canvas.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(bytes.into_inner())
}

/// Background, placement and headline composition.
#[derive(Debug)]
pub struct Compositor {
    overlay: OverlayConfig,
    thresholds: ClassThresholds,
    painter: TextPainter,
}

impl Default for Compositor {
    fn default() -> Self {
        Self {
            overlay: OverlayConfig::default(),
            thresholds: ClassThresholds::default(),
            painter: TextPainter::bitmap(),
        }
    }
}

impl Compositor {
    pub fn new(overlay: OverlayConfig, thresholds: ClassThresholds) -> AdaptResult<Self> {
        let painter = TextPainter::from_config(&overlay)?;
        Ok(Self {
            overlay,
            thresholds,
            painter,
        })
    }

    pub fn from_config(config: &AdapterConfig) -> AdaptResult<Self> {
        Self::new(config.overlay.clone(), config.thresholds)
    }

    /// Compose the output canvas without encoding it.
    pub fn compose(
        &self,
        source: &RgbaImage,
        analysis: &AnalysisResult,
        format: &FormatSpec,
    ) -> AdaptResult<RgbaImage> {
        let (sw, sh) = source.dimensions();
        let plan = placement::plan_with(sw, sh, format, &self.thresholds)?;

        let mut canvas =
            allocate_canvas(format.width, format.height, analysis.background().to_rgba())?;
        blit(&mut canvas, source, &plan)?;

        if let Some(headline) = analysis.headline() {
            let drawn = draw_headline(&mut canvas, headline, &self.overlay, &self.painter);
            debug!(format = %format.key(), drawn, "headline overlay");
        }

        Ok(canvas)
    }

    pub fn render(
        &self,
        source: &RgbaImage,
        analysis: &AnalysisResult,
        format: &FormatSpec,
    ) -> AdaptResult<EncodedImage> {
        let canvas = self.compose(source, analysis, format)?;
        let png = encode_png(&canvas)?;
        Ok(EncodedImage::new(format, png))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::{Color, Style};

    fn analysis(colors: Vec<Color>, text: Vec<String>) -> AnalysisResult {
        AnalysisResult::new(vec![], colors, Style::Modern, text, 5)
    }

    #[test]
    fn test_allocate_canvas() {
        let canvas = allocate_canvas(4, 3, Rgba([1, 2, 3, 255])).unwrap();
        assert_eq!(canvas.dimensions(), (4, 3));
        assert!(canvas.pixels().all(|p| p.0 == [1, 2, 3, 255]));
        assert!(allocate_canvas(0, 3, Rgba([0, 0, 0, 255])).is_err());
    }

    #[test]
    fn test_oversized_canvas_is_render_error() {
        let err = allocate_canvas(MAX_CANVAS_SIDE + 1, 10, Rgba([0, 0, 0, 255])).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::RenderError);

        let err = Compositor::default()
            .render(
                &RgbaImage::from_pixel(8, 8, Rgba([1, 1, 1, 255])),
                &analysis(vec![], vec![]),
                &FormatSpec::new(1_000_000, 1_000_000, "Huge"),
            )
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::RenderError);
        assert!(err.to_string().contains("side limit"), "{err}");
    }

    #[test]
    fn test_letterbox_margins_keep_background() {
        let source = RgbaImage::from_pixel(1600, 1200, Rgba([0, 0, 200, 255]));
        let format = FormatSpec::new(600, 500, "Banner Cuadrado");
        let canvas = Compositor::default()
            .compose(&source, &analysis(vec![Color::new(250, 0, 0)], vec![]), &format)
            .unwrap();

        // dest rect is (0, 25, 600, 450)
        assert_eq!(canvas.get_pixel(300, 10).0, [250, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(300, 490).0, [250, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(300, 250).0, [0, 0, 200, 255]);
        assert_eq!(canvas.get_pixel(0, 25).0, [0, 0, 200, 255]);
    }

    #[test]
    fn test_transparent_source_shows_background() {
        let source = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 0]));
        let format = FormatSpec::new(640, 200, "Banner Rectangular");
        let canvas = Compositor::default()
            .compose(&source, &analysis(vec![], vec![]), &format)
            .unwrap();
        assert!(canvas.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_render_encodes_png() {
        let source = RgbaImage::from_pixel(300, 300, Rgba([10, 200, 10, 255]));
        let format = FormatSpec::new(728, 90, "Leaderboard");
        let encoded = Compositor::default()
            .render(&source, &analysis(vec![], vec!["SALE".into()]), &format)
            .unwrap();
        assert_eq!(encoded.key, "format728x90");
        assert_eq!(&encoded.png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = encoded.decode().unwrap();
        assert_eq!(decoded.dimensions(), (728, 90));
    }
}

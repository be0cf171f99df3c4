//! Prompt-driven rendering.
//!
//! Instead of placing the source pixels, this renderer describes the analysis
//! in a text prompt and hands it to an [`ImageGenerator`]. The bundled
//! [`PlaceholderGenerator`] draws a labelled grey card, standing in for a real
//! image model.

use image::{Rgba, RgbaImage};

use crate::analysis::model::AnalysisResult;
use crate::catalog::FormatSpec;
use crate::error::AdaptResult;
use crate::render::compositor::{allocate_canvas, encode_png};
use crate::render::text::TextPainter;
use crate::render::{EncodedImage, FormatRenderer};

const PLACEHOLDER_FILL: Rgba<u8> = Rgba([0xcc, 0xcc, 0xcc, 255]);
const PLACEHOLDER_INK: Rgba<u8> = Rgba([0x33, 0x33, 0x33, 255]);
const PROMPT_PREVIEW_CHARS: usize = 50;
const PROMPT_PREVIEW_PX: u32 = 10;

/// Text-to-image capability.
pub trait ImageGenerator: Send + Sync {
    fn generate(&self, prompt: &str, width: u32, height: u32) -> AdaptResult<RgbaImage>;
}

/// Describe the analysis and the target format as a generation prompt.
pub fn build_prompt(analysis: &AnalysisResult, format: &FormatSpec) -> String {
    let mut prompt = format!(
        "Adapt this {} advertisement to a {}x{} {} ({}).",
        analysis.style(),
        format.width,
        format.height,
        format.display_name,
        format.ratio_label()
    );

    if !analysis.colors().is_empty() {
        let colors: Vec<String> = analysis.colors().iter().map(|c| c.to_string()).collect();
        prompt.push_str(&format!(" Palette: {}.", colors.join(", ")));
    }

    if !analysis.objects().is_empty() {
        let labels: Vec<&str> = analysis.objects().iter().map(|o| o.label.as_str()).collect();
        prompt.push_str(&format!(" Keep: {}.", labels.join(", ")));
    }

    if let Some(headline) = analysis.headline() {
        prompt.push_str(&format!(" Headline: \"{}\".", headline));
    }

    prompt
}

/// Grey card with the target size and a prompt preview.
#[derive(Debug, Default)]
pub struct PlaceholderGenerator {
    painter: TextPainter,
}

impl PlaceholderGenerator {
    pub fn new(painter: TextPainter) -> Self {
        Self { painter }
    }

    fn draw_centered(&self, canvas: &mut RgbaImage, text: &str, px: u32, middle_y: i32) {
        let (tw, th) = self.painter.measure(text, px);
        let x = (canvas.width() as i32 - tw as i32) / 2;
        let baseline = middle_y + th as i32 / 2;
        self.painter.draw(canvas, text, px, x, baseline, PLACEHOLDER_INK);
    }
}

impl ImageGenerator for PlaceholderGenerator {
    fn generate(&self, prompt: &str, width: u32, height: u32) -> AdaptResult<RgbaImage> {
        let mut canvas = allocate_canvas(width, height, PLACEHOLDER_FILL)?;

        let caption_px = (height / 4).clamp(12, 32);
        let middle = (height / 2) as i32;
        self.draw_centered(&mut canvas, &format!("Generated: {}x{}", width, height), caption_px, middle);

        let preview: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
        self.draw_centered(
            &mut canvas,
            &format!("Prompt: {}...", preview),
            PROMPT_PREVIEW_PX,
            middle + caption_px as i32,
        );

        Ok(canvas)
    }
}

/// Renders formats through an [`ImageGenerator`].
#[derive(Debug, Default)]
pub struct GenerativeRenderer<G> {
    generator: G,
}

impl<G: ImageGenerator> GenerativeRenderer<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }
}

impl<G: ImageGenerator> FormatRenderer for GenerativeRenderer<G> {
    fn name(&self) -> &'static str {
        "generative"
    }

    fn render(
        &self,
        _source: &RgbaImage,
        analysis: &AnalysisResult,
        format: &FormatSpec,
    ) -> AdaptResult<EncodedImage> {
        let prompt = build_prompt(analysis, format);
        tracing::debug!(format = %format.key(), %prompt, "generating");
        let image = self.generator.generate(&prompt, format.width, format.height)?;
        let image = if image.dimensions() == (format.width, format.height) {
            image
        } else {
            image::imageops::resize(&image, format.width, format.height, image::imageops::FilterType::Triangle)
        };
        Ok(EncodedImage::new(format, encode_png(&image)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::{BoundingBox, Color, DetectedObject, Style};

    fn sample_analysis() -> AnalysisResult {
        AnalysisResult::new(
            vec![DetectedObject::new("bottle", 0.9, BoundingBox::new(0.0, 0.0, 1.0, 1.0))],
            vec![Color::new(255, 0, 0)],
            Style::Bold,
            vec!["Texto detectado: sign".into()],
            5,
        )
    }

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt(&sample_analysis(), &FormatSpec::new(728, 90, "Leaderboard"));
        assert_eq!(
            prompt,
            "Adapt this bold advertisement to a 728x90 Leaderboard (8.09:1). \
             Palette: rgb(255, 0, 0). Keep: bottle. Headline: \"Texto detectado: sign\"."
        );
    }

    #[test]
    fn test_placeholder_card() {
        let canvas = PlaceholderGenerator::default().generate("a prompt", 600, 500).unwrap();
        assert_eq!(canvas.dimensions(), (600, 500));
        assert_eq!(canvas.get_pixel(0, 0).0, [0xcc, 0xcc, 0xcc, 255]);
        assert!(canvas.pixels().any(|p| p.0 == [0x33, 0x33, 0x33, 255]));
    }

    #[test]
    fn test_generative_renderer_output_size() {
        let renderer = GenerativeRenderer::new(PlaceholderGenerator::default());
        let source = RgbaImage::new(10, 10);
        let format = FormatSpec::new(640, 200, "Banner Rectangular");
        let encoded = renderer.render(&source, &sample_analysis(), &format).unwrap();
        assert_eq!((encoded.width, encoded.height), (640, 200));
        assert_eq!(encoded.decode().unwrap().get_pixel(0, 0).0, [0xcc, 0xcc, 0xcc, 255]);
    }
}

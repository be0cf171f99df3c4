//! Headline text rendering.
//!
//! Two faces share one measuring and drawing interface: a TrueType font loaded
//! from disk (drawn with `imageproc`), or a built-in 5×7 bitmap face scaled by
//! an integer factor. Both report sizes in output pixels.

use std::fs;
use std::path::Path;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::{Blend, draw_text_mut, text_size};
use tracing::debug;

use crate::config::OverlayConfig;
use crate::error::{AdaptError, AdaptResult};

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
/// Glyph width plus one column of spacing.
const GLYPH_ADVANCE: u32 = GLYPH_W + 1;

enum Face {
    Bitmap,
    TrueType(Box<FontVec>),
}

/// Measures and draws single-line text.
pub struct TextPainter {
    face: Face,
}

impl std::fmt::Debug for TextPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let face = match self.face {
            Face::Bitmap => "bitmap",
            Face::TrueType(_) => "truetype",
        };
        f.debug_struct("TextPainter").field("face", &face).finish()
    }
}

impl Default for TextPainter {
    fn default() -> Self {
        Self::bitmap()
    }
}

impl TextPainter {
    pub fn bitmap() -> Self {
        Self { face: Face::Bitmap }
    }

    pub fn from_font_path(path: impl AsRef<Path>) -> AdaptResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| AdaptError::io(format!("reading font {}", path.display()), e))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| AdaptError::decode(format!("font {}", path.display()), e))?;
        Ok(Self {
            face: Face::TrueType(Box::new(font)),
        })
    }

    /// TrueType face when `font_path` is set, bitmap otherwise.
    pub fn from_config(overlay: &OverlayConfig) -> AdaptResult<Self> {
        match &overlay.font_path {
            Some(path) => Self::from_font_path(path),
            None => Ok(Self::bitmap()),
        }
    }

    /// `(width, height)` of `text` at `px` pixels.
    pub fn measure(&self, text: &str, px: u32) -> (u32, u32) {
        match &self.face {
            Face::Bitmap => {
                let module = bitmap_module(px);
                let n = text.chars().count() as u32;
                if n == 0 {
                    return (0, 0);
                }
                ((n * GLYPH_ADVANCE - 1) * module, GLYPH_H * module)
            }
            Face::TrueType(font) => text_size(PxScale::from(px as f32), &**font, text),
        }
    }

    /// Draw `text` with its left edge at `x` and its baseline at `baseline`,
    /// blended over the canvas.
    pub fn draw(&self, canvas: &mut RgbaImage, text: &str, px: u32, x: i32, baseline: i32, color: Rgba<u8>) {
        match &self.face {
            Face::Bitmap => draw_bitmap_text(canvas, text, px, x, baseline, color),
            Face::TrueType(font) => {
                let scale = PxScale::from(px as f32);
                let ascent = font.as_scaled(scale).ascent().round() as i32;
                let mut blend = Blend(std::mem::take(canvas));
                draw_text_mut(&mut blend, color, x, baseline - ascent, scale, &**font, text);
                *canvas = blend.0;
            }
        }
    }
}

/// Draw the bottom-centered headline if the canvas and text allow it.
///
/// Returns whether anything was drawn. Nothing is drawn when the canvas is not
/// taller than `min_height`, or when the text would be at least
/// `max_width_ratio` of the canvas width.
pub fn draw_headline(canvas: &mut RgbaImage, text: &str, overlay: &OverlayConfig, painter: &TextPainter) -> bool {
    let (w, h) = canvas.dimensions();
    if h <= overlay.min_height || text.is_empty() {
        return false;
    }

    let px = overlay.font_px(h);
    if px == 0 {
        return false;
    }

    let (text_w, _) = painter.measure(text, px);
    if text_w as f64 >= overlay.max_width_ratio * w as f64 {
        debug!(text_w, canvas_w = w, "headline too wide, skipped");
        return false;
    }

    let alpha = (overlay.opacity * 255.0).round().clamp(0.0, 255.0) as u8;
    let x = ((w - text_w) / 2) as i32;
    let baseline = h.saturating_sub(overlay.bottom_margin) as i32;
    painter.draw(canvas, text, px, x, baseline, Rgba([0, 0, 0, alpha]));
    true
}

/// Integer scale factor of the bitmap face for a font size.
fn bitmap_module(px: u32) -> u32 {
    (px / GLYPH_H).max(1)
}

fn draw_bitmap_text(canvas: &mut RgbaImage, text: &str, px: u32, x: i32, baseline: i32, color: Rgba<u8>) {
    let module = bitmap_module(px) as i32;
    let top = baseline - GLYPH_H as i32 * module;
    let (cw, ch) = canvas.dimensions();

    for (i, c) in text.chars().enumerate() {
        let origin_x = x + i as i32 * GLYPH_ADVANCE as i32 * module;
        let rows = glyph(c);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                let x0 = origin_x + col as i32 * module;
                let y0 = top + row as i32 * module;
                for dy in 0..module {
                    for dx in 0..module {
                        let (px_x, px_y) = (x0 + dx, y0 + dy);
                        if px_x < 0 || px_y < 0 || px_x as u32 >= cw || px_y as u32 >= ch {
                            continue;
                        }
                        canvas.get_pixel_mut(px_x as u32, px_y as u32).blend(&color);
                    }
                }
            }
        }
    }
}

/// 5×7 patterns, one `u8` per row, bit 4 is the leftmost column.
fn glyph(c: char) -> [u8; 7] {
    let c = match c {
        'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' => 'A',
        'é' | 'è' | 'ë' | 'ê' | 'É' => 'E',
        'í' | 'ì' | 'ï' | 'Í' => 'I',
        'ó' | 'ò' | 'ö' | 'ô' | 'Ó' => 'O',
        'ú' | 'ù' | 'ü' | 'Ú' => 'U',
        'ñ' | 'Ñ' => 'N',
        other => other.to_ascii_uppercase(),
    };
    match c {
        ' ' => [0; 7],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '.' => [0, 0, 0, 0, 0, 0b01100, 0b01100],
        ',' => [0, 0, 0, 0, 0b01100, 0b00100, 0b01000],
        ':' => [0, 0b01100, 0b01100, 0, 0b01100, 0b01100, 0],
        '-' => [0, 0, 0, 0b11111, 0, 0, 0],
        '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0, 0b00100],
        '?' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0, 0b00100],
        '%' => [0b11000, 0b11001, 0b00010, 0b00100, 0b01000, 0b10011, 0b00011],
        '$' => [0b00100, 0b01111, 0b10100, 0b01110, 0b00101, 0b11110, 0b00100],
        '/' => [0, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0],
        '\'' => [0b00100, 0b00100, 0b01000, 0, 0, 0, 0],
        '"' => [0b01010, 0b01010, 0b01010, 0, 0, 0, 0],
        '(' => [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010],
        ')' => [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000],
        '+' => [0, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0],
        '&' => [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101],
        // unknown glyph: hollow box
        _ => [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn test_bitmap_measure() {
        let painter = TextPainter::bitmap();
        // 24px -> module 3
        assert_eq!(painter.measure("SALE", 24), ((4 * 6 - 1) * 3, 21));
        assert_eq!(painter.measure("", 24), (0, 0));
        assert_eq!(painter.measure("A", 5), (5, 7));
    }

    #[test]
    fn test_headline_drawn_bottom_centered() {
        let overlay = OverlayConfig::default();
        let mut canvas = RgbaImage::from_pixel(600, 500, WHITE);
        assert!(draw_headline(&mut canvas, "SALE", &overlay, &TextPainter::bitmap()));

        let dark: Vec<(u32, u32)> = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] < 255)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!dark.is_empty());
        // baseline at 480, glyphs 21px tall
        assert!(dark.iter().all(|&(_, y)| (459..480).contains(&y)));
        // 70% black over white stays opaque
        let (x, y) = dark[0];
        let pixel = canvas.get_pixel(x, y).0;
        assert!((74..=78).contains(&pixel[0]), "{:?}", pixel);
        assert_eq!(pixel[3], 255);
    }

    #[test]
    fn test_headline_skipped_on_short_canvas() {
        let overlay = OverlayConfig::default();
        let mut canvas = RgbaImage::from_pixel(728, 90, WHITE);
        assert!(!draw_headline(&mut canvas, "SALE", &overlay, &TextPainter::bitmap()));
        assert!(canvas.pixels().all(|p| *p == WHITE));

        let mut canvas = RgbaImage::from_pixel(600, 100, WHITE);
        assert!(!draw_headline(&mut canvas, "SALE", &overlay, &TextPainter::bitmap()));
    }

    #[test]
    fn test_headline_skipped_when_too_wide() {
        let overlay = OverlayConfig::default();
        let mut canvas = RgbaImage::from_pixel(200, 200, WHITE);
        // 20px -> module 2, 12px per char; 14 chars = 166px >= 160
        assert!(!draw_headline(&mut canvas, "ABCDEFGHIJKLMN", &overlay, &TextPainter::bitmap()));
        assert!(canvas.pixels().all(|p| *p == WHITE));
        // 13 chars = 154px < 160
        assert!(draw_headline(&mut canvas, "ABCDEFGHIJKLM", &overlay, &TextPainter::bitmap()));
    }

    #[test]
    fn test_missing_font_is_io_error() {
        let err = TextPainter::from_font_path("/nonexistent/font.ttf").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use ad_format_adapter::analysis::{AnalysisResult, Color, Style};
use image::{Rgba, RgbaImage};

pub const RED: Rgba<u8> = Rgba([220, 20, 20, 255]);
pub const BLUE: Rgba<u8> = Rgba([20, 20, 220, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

/// Top half red, bottom half blue.
pub fn split(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |_, y| if y < height / 2 { RED } else { BLUE })
}

pub fn analysis_with(colors: Vec<Color>, text_lines: Vec<&str>) -> AnalysisResult {
    AnalysisResult::new(
        vec![],
        colors,
        Style::Modern,
        text_lines.into_iter().map(String::from).collect(),
        5,
    )
}

pub fn plain_analysis() -> AnalysisResult {
    analysis_with(vec![], vec![])
}

/// Canvas pixels differing from `background`.
pub fn count_not(canvas: &RgbaImage, background: Rgba<u8>) -> usize {
    canvas.pixels().filter(|p| **p != background).count()
}

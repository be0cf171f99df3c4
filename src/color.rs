//! Dominant color sampling.
//!
//! The image is resampled onto a small square canvas (nearest neighbour), every
//! `stride`-th pixel in raster order is read, and exact RGB triplets are counted.
//! Ties in frequency keep first-seen order.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::analysis::model::Color;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Colors returned at most.
    pub max_colors: usize,
    /// Side of the square sampling canvas.
    pub canvas_side: u32,
    /// Pixel step between samples.
    pub stride: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_colors: 5,
            canvas_side: 100,
            stride: 10,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_colors == 0 {
            return Err("sampler.max_colors must be greater than 0".to_string());
        }
        if self.canvas_side == 0 {
            return Err("sampler.canvas_side must be greater than 0".to_string());
        }
        if self.stride == 0 {
            return Err("sampler.stride must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Top `max_colors` colors with the default sampling grid.
pub fn sample_colors(image: &RgbaImage, max_colors: usize) -> Vec<Color> {
    sample_colors_with(
        image,
        &SamplerConfig {
            max_colors,
            ..SamplerConfig::default()
        },
    )
}

/// Never fails: a zero-area image (or a zero-sized config) yields no colors.
pub fn sample_colors_with(image: &RgbaImage, config: &SamplerConfig) -> Vec<Color> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || config.canvas_side == 0 || config.stride == 0 {
        return Vec::new();
    }

    let side = config.canvas_side;
    let canvas = imageops::resize(image, side, side, FilterType::Nearest);

    let mut counts: IndexMap<Color, usize> = IndexMap::new();
    for pixel in canvas.pixels().step_by(config.stride) {
        let [r, g, b, _] = pixel.0;
        *counts.entry(Color::new(r, g, b)).or_insert(0) += 1;
    }

    let mut ranked: Vec<(Color, usize)> = counts.into_iter().collect();
    // stable: equal counts keep insertion order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(config.max_colors)
        .map(|(color, _)| color)
        .collect()
}

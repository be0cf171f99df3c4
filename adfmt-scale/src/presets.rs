// SPDX-License-Identifier: MIT
//! # Placement Plans and Aspect-Ratio Classes
//!
//! This module decides how a source image is placed into a fixed output format.
//! It is pure geometry: no pixels are touched here, only rectangles.
//!
//! ## Design Philosophy
//!
//! A single fit/crop rule looks wrong somewhere between near-square display
//! units and very wide leaderboards, so planning happens in two steps:
//! 1. **AspectClass**: bucket the *target* aspect ratio with an ordered set of
//!    predicates (very wide, near square, moderate rectangle)
//! 2. **Strategy**: each class picks a composition strategy, possibly looking at
//!    the source aspect ratio as well
//!
//! The result is a [`PlacementPlan`]: a sub-pixel source crop ([`Region`]) and an
//! integer destination rectangle ([`Rect`]).
//!
//! ## Invariants
//!
//! - `dest_rect` always lies inside `[0, target.w) × [0, target.h)`
//! - `source_rect` always lies inside the source bounds
//! - Planning is referentially transparent: identical inputs give identical plans
//! - Centering uses `(container - content) / 2`; destination offsets are floored

use std::fmt;

use serde::{Deserialize, Serialize};

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    /// Width divided by height.
    pub fn aspect_ratio(self) -> f64 {
        f64::from(self.w) / f64::from(self.h)
    }

    pub fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Rectangle in destination pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    /// Rectangle covering a whole canvas.
    pub fn full(size: Size) -> Self {
        Self {
            x: 0,
            y: 0,
            w: size.w,
            h: size.h,
        }
    }

    pub fn size(&self) -> Size {
        Size {
            w: self.w,
            h: self.h,
        }
    }

    /// True when the rectangle is non-empty and lies inside `[0, w) × [0, h)`.
    pub fn fits_within(&self, bounds: Size) -> bool {
        self.w > 0
            && self.h > 0
            && u64::from(self.x) + u64::from(self.w) <= u64::from(bounds.w)
            && u64::from(self.y) + u64::from(self.h) <= u64::from(bounds.h)
    }

    /// True when the rectangle covers the whole canvas.
    pub fn covers(&self, bounds: Size) -> bool {
        *self == Rect::full(bounds)
    }
}

/// Crop region in source pixel coordinates.
///
/// Kept in `f64` because band crops rarely land on whole pixels
/// (e.g. a 1600px wide source cropped for 728×90 keeps a 197.8px band).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Region {
    /// Region covering the whole source.
    pub fn full(size: Size) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: f64::from(size.w),
            h: f64::from(size.h),
        }
    }

    pub fn fits_within(&self, bounds: Size) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.w > 0.0
            && self.h > 0.0
            && self.x + self.w <= f64::from(bounds.w)
            && self.y + self.h <= f64::from(bounds.h)
    }

    /// True when `other` lies entirely inside this region.
    pub fn contains(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.w <= self.x + self.w
            && other.y + other.h <= self.y + self.h
    }
}

/// Composition strategy chosen for one (source, target) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Letterbox a wide source that spans the full target width.
    FitWide,
    /// Letterbox a wide source that spans the full target height.
    FitTall,
    /// Uniform scale, centered on both axes, full source kept.
    CenterScale,
    /// Keep a vertically centered horizontal band, trim top and bottom.
    CropHorizontal,
    /// Keep a horizontally centered vertical band, trim left and right.
    CropVertical,
}

impl Strategy {
    /// Full-bleed strategies fill the whole canvas with source content.
    pub fn is_full_bleed(self) -> bool {
        matches!(self, Strategy::CropHorizontal | Strategy::CropVertical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::FitWide => "fit_wide",
            Strategy::FitTall => "fit_tall",
            Strategy::CenterScale => "center_scale",
            Strategy::CropHorizontal => "crop_horizontal",
            Strategy::CropVertical => "crop_vertical",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds for the aspect-ratio class predicates.
///
/// These are deliberately separate from the format catalog: adding a format
/// never requires touching them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassThresholds {
    /// Target ratios at or above this are very wide (leaderboards).
    pub very_wide_min: f64,
    /// Target ratios at or below this are near square (includes portrait targets).
    pub near_square_max: f64,
    /// In the very-wide class, sources wider than this are letterboxed instead of cropped.
    pub wide_source_min: f64,
}

impl Default for ClassThresholds {
    fn default() -> Self {
        Self {
            very_wide_min: 4.0,
            near_square_max: 1.5,
            wide_source_min: 4.0,
        }
    }
}

impl ClassThresholds {
    pub fn validate(&self) -> Result<(), String> {
        let finite = [self.very_wide_min, self.near_square_max, self.wide_source_min]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0);
        if !finite {
            return Err("Aspect thresholds must be positive finite numbers".to_string());
        }
        if self.near_square_max >= self.very_wide_min {
            return Err(format!(
                "near_square_max ({}) must be below very_wide_min ({})",
                self.near_square_max, self.very_wide_min
            ));
        }
        Ok(())
    }
}

/// Bucket of target aspect ratios sharing one composition rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AspectClass {
    VeryWide,
    NearSquare,
    ModerateRectangle,
}

impl AspectClass {
    /// Evaluation order of the class predicates. First match wins.
    const ORDER: [AspectClass; 3] = [
        AspectClass::VeryWide,
        AspectClass::NearSquare,
        AspectClass::ModerateRectangle,
    ];

    fn matches(self, ratio: f64, t: &ClassThresholds) -> bool {
        match self {
            AspectClass::VeryWide => ratio >= t.very_wide_min,
            AspectClass::NearSquare => ratio <= t.near_square_max,
            AspectClass::ModerateRectangle => true,
        }
    }

    /// Classify a target aspect ratio.
    pub fn classify(ratio: f64, thresholds: &ClassThresholds) -> AspectClass {
        Self::ORDER
            .iter()
            .copied()
            .find(|class| class.matches(ratio, thresholds))
            .unwrap_or(AspectClass::ModerateRectangle)
    }
}

/// Complete placement decision for one (source, target) pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementPlan {
    /// Source image dimensions
    pub input: Size,
    /// Output canvas dimensions
    pub target: Size,
    /// Class of the target aspect ratio
    pub class: AspectClass,
    /// Strategy used to derive the rectangles
    pub strategy: Strategy,
    /// Crop region in source coordinates (may equal the full source)
    pub source_rect: Region,
    /// Placement rectangle in output coordinates
    pub dest_rect: Rect,
}

impl PlacementPlan {
    /// True when the plan leaves part of the canvas to the background fill.
    pub fn has_margins(&self) -> bool {
        !self.dest_rect.covers(self.target)
    }
}

/// Errors raised by [`build_plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    EmptySource(Size),
    EmptyTarget(Size),
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::EmptySource(s) => write!(f, "Source dimensions must be positive, got {}", s),
            PlanError::EmptyTarget(s) => write!(f, "Target dimensions must be positive, got {}", s),
        }
    }
}

impl std::error::Error for PlanError {}

/// Compute a placement plan for `input` rendered into a `target` canvas.
///
/// # Arguments
/// * `input` - Source image dimensions
/// * `target` - Output format dimensions
/// * `thresholds` - Aspect-ratio class thresholds
///
/// # Errors
/// [`PlanError`] if either size has a zero side.
pub fn build_plan(
    input: Size,
    target: Size,
    thresholds: &ClassThresholds,
) -> Result<PlacementPlan, PlanError> {
    if input.is_empty() {
        return Err(PlanError::EmptySource(input));
    }
    if target.is_empty() {
        return Err(PlanError::EmptyTarget(target));
    }

    let class = AspectClass::classify(target.aspect_ratio(), thresholds);
    // Cross-multiplied so equal ratios compare equal regardless of float rounding.
    let source_area_w = u64::from(input.w) * u64::from(target.h);
    let target_area_w = u64::from(target.w) * u64::from(input.h);

    let (strategy, source_rect, dest_rect) = match class {
        AspectClass::VeryWide if input.aspect_ratio() > thresholds.wide_source_min => {
            let strategy = if source_area_w >= target_area_w {
                Strategy::FitWide
            } else {
                Strategy::FitTall
            };
            (strategy, Region::full(input), letterbox(input, target))
        }
        AspectClass::VeryWide => (
            Strategy::CropHorizontal,
            horizontal_band(input, target),
            Rect::full(target),
        ),
        AspectClass::NearSquare => (
            Strategy::CenterScale,
            Region::full(input),
            letterbox(input, target),
        ),
        AspectClass::ModerateRectangle if source_area_w > target_area_w => (
            Strategy::CropVertical,
            vertical_band(input, target),
            Rect::full(target),
        ),
        AspectClass::ModerateRectangle => (
            Strategy::CropHorizontal,
            horizontal_band(input, target),
            Rect::full(target),
        ),
    };

    Ok(PlacementPlan {
        input,
        target,
        class,
        strategy,
        source_rect,
        dest_rect,
    })
}

/// Fit image within a bounding box while preserving aspect ratio.
/// Upscales when the source is smaller than the box.
fn fit_within(input: Size, box_: Size) -> (u32, u32) {
    let (w, h) = (f64::from(input.w), f64::from(input.h));
    let (bw, bh) = (f64::from(box_.w), f64::from(box_.h));
    let s = (bw / w).min(bh / h);
    (
        ((w * s).round() as u32).clamp(1, box_.w),
        ((h * s).round() as u32).clamp(1, box_.h),
    )
}

/// Uniformly scaled source, centered on both axes.
fn letterbox(input: Size, target: Size) -> Rect {
    let (w, h) = fit_within(input, target);
    Rect {
        x: (target.w - w) / 2,
        y: (target.h - h) / 2,
        w,
        h,
    }
}

/// Full-width band of height `src_w / target_ratio`, vertically centered.
fn horizontal_band(input: Size, target: Size) -> Region {
    let (w, h) = (f64::from(input.w), f64::from(input.h));
    let band = (w * f64::from(target.h) / f64::from(target.w)).min(h);
    let y = ((h - band) / 2.0).max(0.0);
    Region {
        x: 0.0,
        y,
        w,
        h: band.min(h - y),
    }
}

/// Full-height band of width `src_h * target_ratio`, horizontally centered.
fn vertical_band(input: Size, target: Size) -> Region {
    let (w, h) = (f64::from(input.w), f64::from(input.h));
    let band = (h * f64::from(target.w) / f64::from(target.h)).min(w);
    let x = ((w - band) / 2.0).max(0.0);
    Region {
        x,
        y: 0.0,
        w: band.min(w - x),
        h,
    }
}

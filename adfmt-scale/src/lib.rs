// SPDX-License-Identifier: MIT
//! # adfmt-scale: Placement Geometry for Fixed Ad Formats
//!
//! This crate decides where a source advertisement lands on a fixed-size output
//! canvas and performs the SIMD-accelerated region scaling that puts it there.
//!
//! ## Key Components
//!
//! - [`presets`]: aspect-ratio classes, composition strategies and plan computation
//! - [`cpu`]: CPU region scaling (crop + resize) using `fast_image_resize`
//!
//! Planning is pure and deterministic; scaling writes only into a caller-provided
//! patch buffer sized to the plan's destination rectangle.
//!
//! ## Usage Example
//!
//! ```rust
//! use adfmt_scale::presets::{build_plan, ClassThresholds, Size, Strategy};
//!
//! let plan = build_plan(
//!     Size { w: 1600, h: 1200 },
//!     Size { w: 600, h: 500 },
//!     &ClassThresholds::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(plan.strategy, Strategy::CenterScale);
//! assert_eq!((plan.dest_rect.y, plan.dest_rect.h), (25, 450));
//! ```

pub mod cpu;
pub mod presets;

// SPDX-License-Identifier: MIT
// CPU region scaler built on fast_image_resize (SIMD-accelerated).
// RGBA8 in → RGBA8 patch out, sized exactly to the plan's destination rect.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x4;
use fir::{FilterType, ResizeAlg, ResizeOptions, Resizer};

use crate::presets::{PlacementPlan, Size};

#[derive(Debug)]
pub enum ScaleError {
    BufferTooSmall { needed: usize, got: usize },
    SourceTooSmall { needed: usize, got: usize },
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
}

impl From<fir::ResizeError> for ScaleError { fn from(e: fir::ResizeError) -> Self { Self::Fir(e) } }
impl From<fir::ImageBufferError> for ScaleError { fn from(e: fir::ImageBufferError) -> Self { Self::ImageBuf(e) } }

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::BufferTooSmall { needed, got } => {
                write!(f, "Output buffer too small: need {} bytes, got {}", needed, got)
            }
            ScaleError::SourceTooSmall { needed, got } => {
                write!(f, "Source buffer too small: need {} bytes, got {}", needed, got)
            }
            ScaleError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            ScaleError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Fir(e) => Some(e),
            ScaleError::ImageBuf(e) => Some(e),
            _ => None,
        }
    }
}

/// Bytes needed for the destination patch of `plan`.
pub fn patch_len(plan: &PlacementPlan) -> usize {
    (plan.dest_rect.w as usize) * (plan.dest_rect.h as usize) * 4
}

/// Scale `plan.source_rect` of a tightly packed RGBA8 source into `dst`.
///
/// `dst` receives a tightly packed `dest_rect.w × dest_rect.h` RGBA8 patch; the
/// caller composites it at `(dest_rect.x, dest_rect.y)`. Nothing outside the
/// destination rectangle is ever written.
///
/// Bilinear convolution with alpha-aware (premultiplied) filtering, so
/// transparent source pixels do not bleed dark fringes into the patch.
pub fn scale_region_rgba(
    resizer: &mut Resizer,
    src_rgba: &[u8],
    src: Size,
    plan: &PlacementPlan,
    dst: &mut [u8],
) -> Result<(), ScaleError> {
    let src_len = (src.w as usize) * (src.h as usize) * 4;
    if src_rgba.len() < src_len {
        return Err(ScaleError::SourceTooSmall { needed: src_len, got: src_rgba.len() });
    }
    let dst_len = patch_len(plan);
    if dst.len() < dst_len {
        return Err(ScaleError::BufferTooSmall { needed: dst_len, got: dst.len() });
    }

    let src_view = TypedImageRef::<U8x4>::from_buffer(src.w, src.h, &src_rgba[..src_len])?;
    let mut dst_image = TypedImage::<U8x4>::from_buffer(
        plan.dest_rect.w,
        plan.dest_rect.h,
        &mut dst[..dst_len],
    )?;

    let crop = plan.source_rect;
    let opts = ResizeOptions::new()
        .resize_alg(ResizeAlg::Convolution(FilterType::Bilinear))
        .crop(crop.x, crop.y, crop.w, crop.h)
        .use_alpha(true);

    resizer.resize_typed::<U8x4>(&src_view, &mut dst_image, &opts)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{build_plan, ClassThresholds};

    fn solid(size: Size, px: [u8; 4]) -> Vec<u8> {
        px.iter().copied().cycle().take((size.w * size.h * 4) as usize).collect()
    }

    #[test]
    fn test_patch_matches_dest_rect() {
        let src = Size::new(160, 120);
        let plan = build_plan(src, Size::new(60, 50), &ClassThresholds::default()).unwrap();
        let data = solid(src, [10, 200, 30, 255]);
        let mut out = vec![0u8; patch_len(&plan)];
        scale_region_rgba(&mut Resizer::new(), &data, src, &plan, &mut out).unwrap();

        assert_eq!(out.len(), 60 * 45 * 4);
        assert!(out.chunks_exact(4).all(|p| p == [10, 200, 30, 255]));
    }

    #[test]
    fn test_rejects_short_buffers() {
        let src = Size::new(8, 8);
        let plan = build_plan(src, Size::new(4, 4), &ClassThresholds::default()).unwrap();
        let data = solid(src, [0, 0, 0, 255]);
        let mut out = vec![0u8; 3];
        let err = scale_region_rgba(&mut Resizer::new(), &data, src, &plan, &mut out).unwrap_err();
        assert!(matches!(err, ScaleError::BufferTooSmall { .. }));

        let mut out = vec![0u8; patch_len(&plan)];
        let err = scale_region_rgba(&mut Resizer::new(), &data[..10], src, &plan, &mut out)
            .unwrap_err();
        assert!(matches!(err, ScaleError::SourceTooSmall { .. }));
    }
}

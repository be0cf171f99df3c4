//! Placement planning against catalog formats.
//!
//! Thin layer over [`adfmt_scale::presets`]: the geometry lives in the scale
//! crate, this module speaks in [`FormatSpec`]s and [`AdaptError`]s.

pub use adfmt_scale::presets::{
    AspectClass, ClassThresholds, PlacementPlan, Rect, Region, Size, Strategy,
};

use crate::catalog::FormatSpec;
use crate::error::AdaptResult;

/// Plan with the default class thresholds.
pub fn plan(source_w: u32, source_h: u32, format: &FormatSpec) -> AdaptResult<PlacementPlan> {
    plan_with(source_w, source_h, format, &ClassThresholds::default())
}

pub fn plan_with(
    source_w: u32,
    source_h: u32,
    format: &FormatSpec,
    thresholds: &ClassThresholds,
) -> AdaptResult<PlacementPlan> {
    let plan = adfmt_scale::presets::build_plan(
        Size::new(source_w, source_h),
        format.size(),
        thresholds,
    )?;
    tracing::debug!(
        format = %format.key(),
        class = ?plan.class,
        strategy = %plan.strategy,
        "placement planned"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_catalog_formats_classify() {
        let cases = [
            (FormatSpec::new(600, 500, "a"), AspectClass::NearSquare),
            (FormatSpec::new(728, 90, "b"), AspectClass::VeryWide),
            (FormatSpec::new(640, 200, "c"), AspectClass::ModerateRectangle),
            (FormatSpec::new(160, 600, "d"), AspectClass::NearSquare),
        ];
        for (format, class) in cases {
            assert_eq!(plan(1000, 1000, &format).unwrap().class, class, "{}", format.key());
        }
    }

    #[test]
    fn test_invalid_dimensions() {
        let err = plan(0, 100, &FormatSpec::new(600, 500, "a")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDimensions);
        let err = plan(100, 100, &FormatSpec::new(600, 0, "a")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDimensions);
    }
}

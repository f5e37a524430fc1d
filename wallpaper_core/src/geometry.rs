// Cover fit: scale media so it fills the container on both axes, centered, aspect preserved.
// Rule: never under-cover. Overflow is cropped by the container.

use crate::error::WallpaperError;
use crate::types::{ContainerBox, LayerFrame, Size};

/// Compute the frame that makes `natural`-sized media cover `container`.
///
/// `ratio_override` replaces the width/height ratio of `natural` when the natural size is only
/// a nominal box (remote embeds). Fails on a non-positive natural size or override; callers
/// only fit media after it reported ready.
pub fn fit(
    container: ContainerBox,
    natural: Size,
    ratio_override: Option<f64>,
) -> Result<LayerFrame, WallpaperError> {
    if !natural.is_positive() {
        return Err(WallpaperError::DegenerateSize {
            width: natural.width,
            height: natural.height,
        });
    }

    let ratio = match ratio_override {
        Some(r) if r.is_finite() && r > 0.0 => r,
        Some(_) => {
            return Err(WallpaperError::DegenerateSize {
                width: natural.width,
                height: natural.height,
            })
        }
        None => natural.aspect(),
    };

    // Height first.
    let mut height = container.height;
    let mut width = height * ratio;

    // Too narrow: lock to width instead.
    if width < container.width {
        width = container.width;
        height = width / ratio;
    }

    Ok(LayerFrame {
        width,
        height,
        left: -(width - container.width) / 2.0,
        top: -(height - container.height) / 2.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn same_aspect_fills_exactly() {
        let frame = fit(
            ContainerBox::new(800.0, 600.0),
            Size::new(400.0, 300.0),
            None,
        )
        .unwrap();
        assert!((frame.width - 800.0).abs() < EPS);
        assert!((frame.height - 600.0).abs() < EPS);
        assert!(frame.left.abs() < EPS);
        assert!(frame.top.abs() < EPS);
    }

    #[test]
    fn wide_media_overflows_horizontally() {
        let frame = fit(
            ContainerBox::new(800.0, 600.0),
            Size::new(1920.0, 1080.0),
            None,
        )
        .unwrap();
        assert_eq!(frame.height, 600.0);
        assert!((frame.width - 1066.666_666).abs() < 1e-3);
        assert!((frame.left + 133.333_333).abs() < 1e-3);
        assert_eq!(frame.top, 0.0);
    }

    #[test]
    fn tall_media_overflows_vertically() {
        let frame = fit(
            ContainerBox::new(1000.0, 400.0),
            Size::new(300.0, 600.0),
            None,
        )
        .unwrap();
        assert_eq!(frame.width, 1000.0);
        assert_eq!(frame.height, 2000.0);
        assert_eq!(frame.left, 0.0);
        assert_eq!(frame.top, -800.0);
    }

    #[test]
    fn ratio_override_replaces_natural_aspect() {
        // Nominal square box, 16:9 override.
        let frame = fit(
            ContainerBox::new(1600.0, 900.0),
            Size::new(500.0, 500.0),
            Some(16.0 / 9.0),
        )
        .unwrap();
        assert!((frame.width - 1600.0).abs() < EPS);
        assert!((frame.height - 900.0).abs() < EPS);
    }

    #[test]
    fn rejects_undecoded_media() {
        let err = fit(ContainerBox::new(800.0, 600.0), Size::new(0.0, 0.0), None).unwrap_err();
        assert!(matches!(err, WallpaperError::DegenerateSize { .. }));
    }

    #[test]
    fn rejects_bad_override() {
        assert!(fit(
            ContainerBox::new(800.0, 600.0),
            Size::new(500.0, 500.0),
            Some(0.0)
        )
        .is_err());
    }

    proptest! {
        /// Property: the fitted frame always covers the container and is centered on it.
        #[test]
        fn fit_covers_and_centers(
            cw in 1.0f64..4000.0,
            ch in 1.0f64..4000.0,
            nw in 1.0f64..8000.0,
            nh in 1.0f64..8000.0,
        ) {
            let container = ContainerBox::new(cw, ch);
            let frame = fit(container, Size::new(nw, nh), None).unwrap();

            let tol = 1e-9 * cw.max(ch).max(frame.width).max(frame.height);
            prop_assert!(frame.width >= cw - tol, "width {} < {}", frame.width, cw);
            prop_assert!(frame.height >= ch - tol, "height {} < {}", frame.height, ch);
            prop_assert!((frame.left + (frame.width - cw) / 2.0).abs() <= tol);
            prop_assert!((frame.top + (frame.height - ch) / 2.0).abs() <= tol);

            // Aspect preserved.
            let aspect = nw / nh;
            prop_assert!(((frame.width / frame.height) - aspect).abs() <= 1e-9 * aspect.max(1.0 / aspect) * 4.0);
        }

        /// Property: fitting is a pure function of its inputs.
        #[test]
        fn fit_is_idempotent(
            cw in 1.0f64..4000.0,
            ch in 1.0f64..4000.0,
            ratio in 0.1f64..10.0,
        ) {
            let container = ContainerBox::new(cw, ch);
            let natural = Size::new(500.0, 500.0);
            let a = fit(container, natural, Some(ratio)).unwrap();
            let b = fit(container, natural, Some(ratio)).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}

//! Aspect-ratio padding, border trimming and coverage-based scaling.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel, Rgb, RgbImage, RgbaImage};

use crate::garment::CoverageRatio;

/// Ratios closer than this to the target are left alone.
const ASPECT_TOLERANCE: f64 = 0.01;

/// Per-channel difference from the corner color that counts as content.
const BORDER_TOLERANCE: u8 = 10;

/// Extra rows tried when rounding keeps a small image off the target ratio.
const MAX_PAD_SEARCH: u32 = 256;

/// Guards against `floor` dropping a pixel to float error on exact products.
const FLOOR_EPSILON: f64 = 1e-6;

const PAD_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Pad an image with white so that `width / height` reaches `target_ratio`.
///
/// Narrow images grow symmetrically left/right, wide images top/bottom. Never crops.
/// The result is always within the ratio tolerance, so a second call with the
/// same ratio is a no-op. Very small images may grow on both axes to get there.
pub fn pad_to_aspect_ratio(image: &RgbImage, target_ratio: f32) -> RgbImage {
    let (w, h) = image.dimensions();
    if !(target_ratio.is_finite() && target_ratio > 0.0) || w == 0 || h == 0 {
        return image.clone();
    }

    let target = f64::from(target_ratio);
    let ratio = f64::from(w) / f64::from(h);
    if (ratio - target).abs() < ASPECT_TOLERANCE {
        return image.clone();
    }

    let (new_w, new_h) = padded_dimensions((w, h), target);

    if (new_w, new_h) == (w, h) {
        return image.clone();
    }

    tracing::debug!(
        from = ?(w, h),
        to = ?(new_w, new_h),
        target_ratio,
        "padding to aspect ratio"
    );

    let mut canvas = RgbImage::from_pixel(new_w, new_h, PAD_COLOR);
    let x = (new_w - w) / 2;
    let y = (new_h - h) / 2;
    imageops::replace(&mut canvas, image, i64::from(x), i64::from(y));
    canvas
}

/// Canvas at least `(w, h)` whose ratio lands within tolerance of `target`.
///
/// Starts from the height the width alone calls for and grows it one row at a
/// time. Normal photos settle within a row or two.
fn padded_dimensions((w, h): (u32, u32), target: f64) -> (u32, u32) {
    let start = ((f64::from(w) / target + FLOOR_EPSILON).floor() as u32).max(h);
    let width_for = |height: u32| ((f64::from(height) * target).round() as u32).max(w);
    let last = start.saturating_add(MAX_PAD_SEARCH);
    (start..last)
        .map(|height| (width_for(height), height))
        .find(|&(width, height)| {
            (f64::from(width) / f64::from(height) - target).abs() < ASPECT_TOLERANCE
        })
        .unwrap_or_else(|| (width_for(last), last))
}

/// Crop away a uniform border whose color matches the top-left pixel.
///
/// Returns the image unchanged when every pixel matches the border color.
pub fn trim_uniform_border<P>(
    image: &ImageBuffer<P, Vec<u8>>,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }

    let background = *image.get_pixel(0, 0);
    let differs = |px: &P| {
        px.channels()
            .iter()
            .zip(background.channels())
            .any(|(a, b)| a.abs_diff(*b) > BORDER_TOLERANCE)
    };

    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, px) in image.enumerate_pixels() {
        if !differs(px) {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    match bounds {
        Some((x0, y0, x1, y1)) => {
            let (crop_w, crop_h) = (x1 - x0 + 1, y1 - y0 + 1);
            if (crop_w, crop_h) != (w, h) {
                tracing::debug!(from = ?(w, h), to = ?(crop_w, crop_h), "trimmed uniform border");
            }
            imageops::crop_imm(image, x0, y0, crop_w, crop_h).to_image()
        }
        None => image.clone(),
    }
}

/// Target size for an image of `source` dimensions that should span
/// `coverage` of the canvas height.
///
/// With `max_canvas_width_fraction` set, the width is capped at that fraction
/// of the canvas width and the height shrinks to keep the aspect ratio.
pub fn coverage_dimensions(
    source: (u32, u32),
    canvas: (u32, u32),
    coverage: CoverageRatio,
    max_canvas_width_fraction: Option<f32>,
) -> (u32, u32) {
    let (src_w, src_h) = (f64::from(source.0), f64::from(source.1));
    let (canvas_w, canvas_h) = (f64::from(canvas.0), f64::from(canvas.1));
    let aspect = src_w / src_h;

    let mut height = canvas_h * f64::from(coverage.get());
    let mut width = height * aspect;

    if let Some(fraction) = max_canvas_width_fraction {
        let max_width = canvas_w * f64::from(fraction.max(0.0));
        if max_width > 0.0 && width > max_width {
            width = max_width;
            height = width / aspect;
        }
    }

    (to_pixels(width), to_pixels(height))
}

/// Resize a cutout so it spans `coverage` of the canvas height, capped in width.
///
/// Returns the resized image together with its width and height.
pub fn scale_to_coverage(
    image: &RgbaImage,
    canvas: (u32, u32),
    coverage: CoverageRatio,
    max_canvas_width_fraction: f32,
    filter: FilterType,
) -> (RgbaImage, u32, u32) {
    let (width, height) = coverage_dimensions(
        image.dimensions(),
        canvas,
        coverage,
        Some(max_canvas_width_fraction),
    );
    let scaled = imageops::resize(image, width, height, smooth_filter(filter));
    (scaled, width, height)
}

/// Nearest-neighbour resampling is replaced by Lanczos3; the rest pass through.
pub fn smooth_filter(filter: FilterType) -> FilterType {
    match filter {
        FilterType::Nearest => FilterType::Lanczos3,
        other => other,
    }
}

/// Round a positive length to whole pixels, never below one.
pub(crate) fn to_pixels(length: f64) -> u32 {
    if length.is_finite() {
        length.round().clamp(1.0, f64::from(u32::MAX)) as u32
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn rgb_image(w: u32, h: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb(color))
    }

    fn ratio(image: &RgbImage) -> f64 {
        f64::from(image.width()) / f64::from(image.height())
    }

    mod pad_to_aspect_ratio {
        use super::*;

        mod unit {
            use super::*;

            #[test]
            fn matching_ratio_is_unchanged() {
                let input = rgb_image(300, 400, [10, 20, 30]);
                let result = pad_to_aspect_ratio(&input, 0.75);
                assert_eq!(result.dimensions(), (300, 400));
            }

            #[test]
            fn within_tolerance_is_unchanged() {
                let input = rgb_image(302, 400, [10, 20, 30]);
                let result = pad_to_aspect_ratio(&input, 0.75);
                assert_eq!(result.dimensions(), (302, 400));
            }

            #[test]
            fn narrow_image_is_padded_left_and_right() {
                let input = rgb_image(100, 400, [0, 0, 255]);
                let result = pad_to_aspect_ratio(&input, 0.75);

                assert_eq!(result.dimensions(), (300, 400));
                // 100 px of padding on each side
                assert_eq!(result.get_pixel(0, 200).0, [255, 255, 255]);
                assert_eq!(result.get_pixel(99, 200).0, [255, 255, 255]);
                assert_eq!(result.get_pixel(100, 200).0, [0, 0, 255]);
                assert_eq!(result.get_pixel(199, 200).0, [0, 0, 255]);
                assert_eq!(result.get_pixel(200, 200).0, [255, 255, 255]);
            }

            #[test]
            fn wide_image_is_padded_top_and_bottom() {
                // folded jeans photographed flat
                let input = rgb_image(600, 200, [0, 0, 255]);
                let result = pad_to_aspect_ratio(&input, 0.75);

                assert_eq!(result.dimensions(), (600, 800));
                assert_eq!(result.get_pixel(300, 0).0, [255, 255, 255]);
                assert_eq!(result.get_pixel(300, 299).0, [255, 255, 255]);
                assert_eq!(result.get_pixel(300, 300).0, [0, 0, 255]);
                assert_eq!(result.get_pixel(300, 499).0, [0, 0, 255]);
                assert_eq!(result.get_pixel(300, 500).0, [255, 255, 255]);
                assert!((ratio(&result) - 0.75).abs() <= 0.01);
            }

            #[test]
            fn wide_photo_rounding_stays_within_tolerance() {
                // 299 / 2.5 = 119.6; flooring to 119 rows alone would miss by 0.013
                let input = rgb_image(299, 100, [0, 0, 255]);
                let result = pad_to_aspect_ratio(&input, 2.5);
                assert!((ratio(&result) - 2.5).abs() <= 0.01, "{:?}", result.dimensions());
                assert!(result.width() >= 299 && result.height() >= 100);
            }

            #[test]
            fn tiny_image_grows_on_both_axes() {
                let input = rgb_image(3, 1, [0, 0, 255]);
                let result = pad_to_aspect_ratio(&input, 2.5);
                assert!((ratio(&result) - 2.5).abs() <= 0.01, "{:?}", result.dimensions());
            }

            #[test]
            fn invalid_ratio_is_ignored() {
                let input = rgb_image(10, 20, [1, 2, 3]);
                assert_eq!(pad_to_aspect_ratio(&input, 0.0).dimensions(), (10, 20));
                assert_eq!(pad_to_aspect_ratio(&input, f32::NAN).dimensions(), (10, 20));
            }
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                /// pad_to_aspect_ratio: lands within 0.01 of the target and never shrinks
                #[test]
                fn reaches_target_without_cropping(
                    w in 1u32..300,
                    h in 1u32..300,
                    target in 0.25f32..4.0f32
                ) {
                    let input = rgb_image(w, h, [0, 0, 0]);
                    let result = pad_to_aspect_ratio(&input, target);
                    let (out_w, out_h) = result.dimensions();
                    let t = f64::from(target);

                    prop_assert!(out_w >= w && out_h >= h);
                    let error = (f64::from(out_w) / f64::from(out_h) - t).abs();
                    prop_assert!(error <= 0.01, "{out_w}x{out_h} vs {t}");
                }

                /// pad_to_aspect_ratio: a second pass changes nothing
                #[test]
                fn is_idempotent(
                    w in 1u32..300,
                    h in 1u32..300,
                    target in 0.25f32..4.0f32
                ) {
                    let input = rgb_image(w, h, [0, 0, 0]);
                    let once = pad_to_aspect_ratio(&input, target);
                    let twice = pad_to_aspect_ratio(&once, target);
                    prop_assert_eq!(once.dimensions(), twice.dimensions());
                }
            }
        }
    }

    mod trim_uniform_border {
        use super::*;

        mod unit {
            use super::*;

            #[test]
            fn crops_to_content() {
                let mut input = rgb_image(10, 8, [255, 255, 255]);
                for y in 2..5 {
                    for x in 3..7 {
                        input.put_pixel(x, y, Rgb([200, 0, 0]));
                    }
                }

                let result = trim_uniform_border(&input);
                assert_eq!(result.dimensions(), (4, 3));
                assert!(result.pixels().all(|px| px.0 == [200, 0, 0]));
            }

            #[test]
            fn near_background_noise_is_ignored() {
                let mut input = rgb_image(6, 6, [250, 250, 250]);
                input.put_pixel(0, 5, Rgb([245, 245, 245]));
                input.put_pixel(3, 3, Rgb([0, 0, 0]));

                let result = trim_uniform_border(&input);
                assert_eq!(result.dimensions(), (1, 1));
            }

            #[test]
            fn uniform_image_is_unchanged() {
                let input = rgb_image(5, 7, [12, 34, 56]);
                let result = trim_uniform_border(&input);
                assert_eq!(result.dimensions(), (5, 7));
            }

            #[test]
            fn works_on_rgba() {
                let mut input = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
                input.put_pixel(1, 2, Rgba([0, 0, 0, 255]));
                let result = trim_uniform_border(&input);
                assert_eq!(result.dimensions(), (1, 1));
            }
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                /// trim_uniform_border: uniform images are never reduced to zero area
                #[test]
                fn uniform_never_zero_area(
                    w in 1u32..40,
                    h in 1u32..40,
                    r in proptest::num::u8::ANY,
                    g in proptest::num::u8::ANY,
                    b in proptest::num::u8::ANY
                ) {
                    let input = rgb_image(w, h, [r, g, b]);
                    let result = trim_uniform_border(&input);
                    prop_assert_eq!(result.dimensions(), (w, h));
                }

                /// trim_uniform_border: output never exceeds the input
                #[test]
                fn never_grows(
                    w in 1u32..30,
                    h in 1u32..30,
                    px in 0u32..900,
                    value in proptest::num::u8::ANY
                ) {
                    let mut input = rgb_image(w, h, [255, 255, 255]);
                    input.put_pixel(px % w, (px / w) % h, Rgb([value, 0, 0]));
                    let result = trim_uniform_border(&input);
                    let (out_w, out_h) = result.dimensions();
                    prop_assert!(out_w >= 1 && out_h >= 1);
                    prop_assert!(out_w <= w && out_h <= h);
                }
            }
        }
    }

    mod coverage_dimensions {
        use super::*;

        #[test]
        fn height_follows_coverage() {
            let coverage = CoverageRatio::new(0.5).unwrap();
            let dims = coverage_dimensions((100, 200), (1000, 1000), coverage, Some(1.0));
            assert_eq!(dims, (250, 500));
        }

        #[test]
        fn width_cap_preserves_aspect() {
            // 2:1 garment at full height would be 2000 wide
            let coverage = CoverageRatio::new(1.0).unwrap();
            let dims = coverage_dimensions((400, 200), (1000, 1000), coverage, Some(0.8));
            assert_eq!(dims, (800, 400));
        }

        #[test]
        fn uncapped_height_is_exact() {
            let coverage = CoverageRatio::new(0.6).unwrap();
            let dims = coverage_dimensions((600, 200), (1000, 1000), coverage, None);
            assert_eq!(dims, (1800, 600));
        }

        #[test]
        fn never_collapses_to_zero() {
            let coverage = CoverageRatio::new(0.001).unwrap();
            let dims = coverage_dimensions((10, 1000), (50, 50), coverage, Some(1.0));
            assert_eq!(dims, (1, 1));
        }
    }

    mod scale_to_coverage {
        use super::*;

        #[test]
        fn resizes_to_reported_dimensions() {
            let input = RgbaImage::from_pixel(40, 80, Rgba([9, 9, 9, 255]));
            let coverage = CoverageRatio::new(0.5).unwrap();
            let (scaled, w, h) =
                scale_to_coverage(&input, (200, 200), coverage, 1.0, FilterType::Lanczos3);
            assert_eq!((w, h), (50, 100));
            assert_eq!(scaled.dimensions(), (50, 100));
        }
    }

    mod smooth_filter {
        use super::*;

        #[test]
        fn nearest_is_upgraded() {
            assert_eq!(smooth_filter(FilterType::Nearest), FilterType::Lanczos3);
            assert_eq!(smooth_filter(FilterType::Triangle), FilterType::Triangle);
            assert_eq!(smooth_filter(FilterType::CatmullRom), FilterType::CatmullRom);
        }
    }
}

//! Landmark-guided overlay of a garment cutout onto a person photo.

use image::imageops;
use image::{DynamicImage, RgbImage};

use crate::config::ComposeOptions;
use crate::garment::{CoverageRatio, GarmentCategory};
use crate::geometry::{coverage_dimensions, smooth_filter, to_pixels};
use crate::keyer::remove_light_background_with;
use crate::landmarks::BodyLandmarks;
use crate::layer::{flatten, overlay_at};

/// Width multiplier over the shoulder span for trousers and shorts.
const LOWER_BODY_WIDTH_FACTOR: f64 = 1.3;

/// Width multiplier for tops and dresses, which need room to drape.
const DRAPE_WIDTH_FACTOR: f64 = 1.5;

/// Lower-body garments start this fraction of the person height below the torso center.
const WAIST_DROP: f64 = 0.05;

/// Largest garment span, per axis, as a multiple of the person canvas.
const MAX_CANVAS_SPAN: f64 = 4.0;

/// Where and how large the garment lands on the person canvas.
///
/// `x` and `y` may be negative or exceed the canvas; the overlay clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Compute the garment rectangle for a person of `person` dimensions.
pub fn compute_placement(
    person: (u32, u32),
    garment: (u32, u32),
    landmarks: &BodyLandmarks,
    category: GarmentCategory,
    coverage: Option<CoverageRatio>,
    options: &ComposeOptions,
) -> Placement {
    let (person_w, person_h) = (f64::from(person.0), f64::from(person.1));
    let aspect = f64::from(garment.0) / f64::from(garment.1.max(1));
    let is_lower = category == GarmentCategory::LowerBody;

    let (width, height) = match coverage {
        Some(coverage) => {
            coverage_dimensions(garment, person, coverage, options.max_width_fraction)
        }
        None => {
            let factor = if is_lower {
                LOWER_BODY_WIDTH_FACTOR
            } else {
                DRAPE_WIDTH_FACTOR
            };
            let width = person_w * f64::from(landmarks.shoulder_width_ratio) * factor;
            (to_pixels(width), to_pixels(width / aspect))
        }
    };
    let (width, height) = bound_to_canvas((width, height), person);

    let center_x = f64::from(landmarks.torso_center_x) * person_w;
    let center_y = f64::from(landmarks.torso_center_y) * person_h;
    let x = center_x - f64::from(width) / 2.0;
    let y = if is_lower {
        center_y + person_h * WAIST_DROP
    } else {
        center_y - f64::from(height) / 3.0
    };

    let placement = Placement {
        x: x.round() as i64,
        y: y.round() as i64,
        width,
        height,
    };
    tracing::debug!(
        ?placement,
        ?category,
        coverage = ?coverage.map(CoverageRatio::get),
        "garment placement"
    );
    placement
}

/// Shrink `size` uniformly so neither side exceeds [`MAX_CANVAS_SPAN`] times the canvas.
///
/// Landmarks far outside `[0, 1]` stay valid but would otherwise ask for
/// garments many times larger than the photo.
fn bound_to_canvas(size: (u32, u32), canvas: (u32, u32)) -> (u32, u32) {
    let (width, height) = (f64::from(size.0), f64::from(size.1));
    let max_width = f64::from(canvas.0.max(1)) * MAX_CANVAS_SPAN;
    let max_height = f64::from(canvas.1.max(1)) * MAX_CANVAS_SPAN;
    let scale = (max_width / width).min(max_height / height);
    if scale >= 1.0 {
        return size;
    }
    tracing::debug!(?size, ?canvas, "garment larger than canvas bound, shrinking");
    (to_pixels(width * scale), to_pixels(height * scale))
}

/// Key the garment, scale it, and paste it over the person.
///
/// The result has the person's dimensions and no alpha channel.
pub fn compose(
    person: &DynamicImage,
    garment: &DynamicImage,
    landmarks: &BodyLandmarks,
    category: GarmentCategory,
    coverage: Option<CoverageRatio>,
    options: &ComposeOptions,
) -> RgbImage {
    let mut canvas = person.to_rgba8();
    let cutout = remove_light_background_with(garment, options.light_threshold);

    let placement = compute_placement(
        canvas.dimensions(),
        cutout.dimensions(),
        landmarks,
        category,
        coverage,
        options,
    );
    let resized = imageops::resize(
        &cutout,
        placement.width,
        placement.height,
        smooth_filter(options.resize_filter),
    );

    overlay_at(&mut canvas, &resized, placement.x, placement.y);
    flatten(&canvas)
}

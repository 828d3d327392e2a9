use image::{DynamicImage, Rgba, RgbaImage};

use crate::config::DEFAULT_LIGHT_THRESHOLD;

const KEYED_PIXEL: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Turn near-white pixels transparent, producing an approximate garment cutout.
///
/// This is a color threshold, not segmentation: white areas that belong to the
/// garment itself are keyed out too.
pub fn remove_light_background(image: &DynamicImage) -> RgbaImage {
    remove_light_background_with(image, DEFAULT_LIGHT_THRESHOLD)
}

/// [`remove_light_background`] with an explicit threshold.
///
/// A pixel is keyed when all three color channels exceed `threshold`; keyed
/// pixels become transparent white, every other pixel keeps its color and alpha.
pub fn remove_light_background_with(image: &DynamicImage, threshold: u8) -> RgbaImage {
    let mut rgba = image.to_rgba8();
    key_in_place(&mut rgba, threshold);
    rgba
}

pub(crate) fn key_in_place(rgba: &mut RgbaImage, threshold: u8) {
    let mut keyed = 0usize;
    for px in rgba.pixels_mut() {
        if is_light(px, threshold) {
            *px = KEYED_PIXEL;
            keyed += 1;
        }
    }
    tracing::debug!(keyed, total = rgba.len() / 4, threshold, "keyed light background");
}

fn is_light(px: &Rgba<u8>, threshold: u8) -> bool {
    let [r, g, b, _] = px.0;
    r > threshold && g > threshold && b > threshold
}

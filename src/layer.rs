use image::{Rgb, RgbImage, Rgba, RgbaImage};

/// Porter-Duff "over" for a single pixel.
fn blend_over(bg_px: &Rgba<u8>, fg_px: &Rgba<u8>) -> Rgba<u8> {
    let fg_a = fg_px[3] as f32 / 255.0;
    let bg_a = bg_px[3] as f32 / 255.0;
    let out_a = fg_a + bg_a * (1.0 - fg_a);

    let mut rgba = [0u8; 4];
    if out_a > 0.0 {
        let fg_weight = fg_a / out_a;
        let bg_weight = (bg_a * (1.0 - fg_a)) / out_a;
        for c in 0..3 {
            let blended = fg_px[c] as f32 * fg_weight + bg_px[c] as f32 * bg_weight;
            rgba[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
    rgba[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(rgba)
}

/// Composite `top` over `base` with its top-left corner at (`x`, `y`).
///
/// The offset may be negative or push `top` past the edges; only the
/// overlapping region is touched. Fully transparent pixels of `top` leave
/// `base` as it was.
pub fn overlay_at(base: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    let (base_w, base_h) = (i64::from(base.width()), i64::from(base.height()));
    let (top_w, top_h) = (i64::from(top.width()), i64::from(top.height()));

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + top_w).min(base_w);
    let y1 = (y + top_h).min(base_h);
    if x0 >= x1 || y0 >= y1 {
        tracing::debug!(x, y, "overlay lies entirely outside the canvas");
        return;
    }

    for by in y0..y1 {
        for bx in x0..x1 {
            let fg_px = top.get_pixel((bx - x) as u32, (by - y) as u32);
            if fg_px[3] == 0 {
                continue;
            }
            let bg_px = base.get_pixel_mut(bx as u32, by as u32);
            let blended = blend_over(bg_px, fg_px);
            *bg_px = blended;
        }
    }
}

/// Drop the alpha channel, producing an opaque image.
pub fn flatten(image: &RgbaImage) -> RgbImage {
    let (w, h) = image.dimensions();
    let mut out = RgbImage::new(w, h);
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        *dst = Rgb([src[0], src[1], src[2]]);
    }
    out
}

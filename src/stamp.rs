//! Disclaimer watermark drawn along the bottom edge of a result.

use std::fs;
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::config::StampOptions;
use crate::glyphs;
use crate::{TryOnError, TryOnResult};

const FILL: Rgb<u8> = Rgb([255, 255, 255]);
const OUTLINE: Rgb<u8> = Rgb([0, 0, 0]);
const OUTLINE_OFFSETS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Clear space kept at the left and right edges when text must shrink to fit.
const SIDE_PADDING: u32 = 8;

/// Attempts at shrinking wide text before drawing it clipped.
const SHRINK_STEPS: usize = 8;

/// Draws outlined disclaimer text centered near the bottom of an image.
///
/// Uses the first loadable font from the options and otherwise the built-in
/// bitmap font. Text wider than the image is shrunk below the configured
/// size until it fits, down to the smallest size the font allows. Stamping
/// never fails: on any rendering problem the image is returned as it was.
pub struct DisclaimerStamper {
    options: StampOptions,
    font: Option<FontVec>,
}

impl DisclaimerStamper {
    pub fn new(options: StampOptions) -> Self {
        let font = load_font(&options);
        Self { options, font }
    }

    /// Whether a vector font was found; `false` means the bitmap font is used.
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn options(&self) -> &StampOptions {
        &self.options
    }

    /// Draw `text` onto `image`. Empty text leaves the image untouched.
    pub fn stamp(&self, mut image: RgbImage, text: &str) -> RgbImage {
        if text.trim().is_empty() {
            return image;
        }
        let backup = image.clone();
        match self.render(&mut image, text) {
            Ok(()) => image,
            Err(err) => {
                tracing::warn!(error = %err, "skipping disclaimer");
                backup
            }
        }
    }

    fn render(&self, image: &mut RgbImage, text: &str) -> TryOnResult<()> {
        let (width, height) = image.dimensions();
        let max_width = width.saturating_sub(2 * SIDE_PADDING);

        let mut font_px = self.options.font_px(height);
        let mut layout = self.layout(text, font_px);
        for _ in 0..SHRINK_STEPS {
            let (text_w, _) = layout.size();
            if text_w <= max_width || font_px <= 1.0 {
                break;
            }
            let fit = (max_width as f32 / text_w as f32).clamp(0.5, 0.98);
            font_px = (font_px * fit).max(1.0);
            layout = self.layout(text, font_px);
        }

        let (text_w, text_h) = layout.size();
        if text_h == 0 || text_h + self.options.bottom_margin > height {
            return Err(TryOnError::Render(format!(
                "{width}x{height} image cannot fit {text_h}px text"
            )));
        }

        let x = (i64::from(width) - i64::from(text_w)) / 2;
        let y = i64::from(height) - i64::from(self.options.bottom_margin) - i64::from(text_h);
        tracing::debug!(x, y, text_w, text_h, font_px, "stamping disclaimer");

        for (dx, dy) in OUTLINE_OFFSETS {
            self.draw(image, &layout, OUTLINE, x + dx, y + dy, text)?;
        }
        self.draw(image, &layout, FILL, x, y, text)
    }

    fn layout(&self, text: &str, font_px: f32) -> TextLayout {
        match &self.font {
            Some(font) => {
                let scale = PxScale::from(font_px);
                let (text_w, text_h) = text_size(scale, font, text);
                TextLayout::Vector { scale, text_w, text_h }
            }
            None => {
                let scale = (font_px / glyphs::GLYPH_HEIGHT as f32).round().max(1.0) as u32;
                let (text_w, text_h) = glyphs::text_size(text, scale);
                TextLayout::Bitmap { scale, text_w, text_h }
            }
        }
    }

    fn draw(
        &self,
        image: &mut RgbImage,
        layout: &TextLayout,
        color: Rgb<u8>,
        x: i64,
        y: i64,
        text: &str,
    ) -> TryOnResult<()> {
        match (layout, &self.font) {
            (TextLayout::Vector { scale, .. }, Some(font)) => {
                let x = i32::try_from(x).map_err(|_| TryOnError::Render("x out of range".into()))?;
                let y = i32::try_from(y).map_err(|_| TryOnError::Render("y out of range".into()))?;
                draw_text_mut(image, color, x, y, *scale, font, text);
            }
            (TextLayout::Bitmap { scale, .. }, _) => {
                glyphs::draw_text(image, color, x, y, *scale, text);
            }
            (TextLayout::Vector { .. }, None) => {
                return Err(TryOnError::Render("font disappeared".into()));
            }
        }
        Ok(())
    }
}

enum TextLayout {
    Vector { scale: PxScale, text_w: u32, text_h: u32 },
    Bitmap { scale: u32, text_w: u32, text_h: u32 },
}

impl TextLayout {
    fn size(&self) -> (u32, u32) {
        match *self {
            Self::Vector { text_w, text_h, .. } | Self::Bitmap { text_w, text_h, .. } => {
                (text_w, text_h)
            }
        }
    }
}

fn load_font(options: &StampOptions) -> Option<FontVec> {
    options
        .font_path
        .iter()
        .chain(options.font_candidates.iter())
        .find_map(|path| match read_font(path) {
            Ok(font) => {
                tracing::debug!(path = %path.display(), "loaded disclaimer font");
                Some(font)
            }
            Err(err) => {
                tracing::trace!(path = %path.display(), error = %err, "font unavailable");
                None
            }
        })
        .or_else(|| {
            tracing::debug!("no usable font found, using built-in bitmap font");
            None
        })
}

fn read_font(path: &Path) -> TryOnResult<FontVec> {
    let bytes = fs::read(path)?;
    FontVec::try_from_vec(bytes).map_err(|err| TryOnError::Render(err.to_string()))
}

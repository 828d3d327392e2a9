use std::path::PathBuf;

use image::imageops::FilterType;

use crate::garment::{CategoryKeywords, CoverageRatio, GarmentCategory};

/// Brightness above which all three channels must sit for a pixel to be keyed out.
pub const DEFAULT_LIGHT_THRESHOLD: u8 = 200;

/// Disclaimer stamped on every try-on result.
pub const DEFAULT_DISCLAIMER: &str = "AI-generated preview. Actual fit and color may vary.";

/// Options for the landmark-guided compositor.
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    /// Filter used when resizing the garment cutout. `Nearest` is upgraded
    /// to Lanczos3 when the compositor resizes.
    pub resize_filter: FilterType,
    /// Light-background keying threshold (0-255).
    pub light_threshold: u8,
    /// Optional cap on garment width as a fraction of the person width,
    /// applied when a coverage ratio sizes the garment. `None` keeps the
    /// height at exactly `person_height * coverage`.
    pub max_width_fraction: Option<f32>,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            resize_filter: FilterType::Lanczos3,
            light_threshold: DEFAULT_LIGHT_THRESHOLD,
            max_width_fraction: None,
        }
    }
}

/// How the garment photo is normalized before it reaches a stage.
#[derive(Debug, Clone)]
pub struct GarmentPrep {
    /// Crop uniform product-shot margins before compositing.
    pub trim_border: bool,
    /// Width/height ratio the garment is padded to before a generative call.
    pub generative_aspect_ratio: f32,
}

impl Default for GarmentPrep {
    fn default() -> Self {
        Self {
            trim_border: true,
            generative_aspect_ratio: 0.75,
        }
    }
}

/// Canonical per-category coverage ratios used when a garment carries none.
#[derive(Debug, Clone, Copy)]
pub struct CoverageTable {
    pub upper_body: CoverageRatio,
    pub lower_body: CoverageRatio,
    pub dress: CoverageRatio,
}

impl CoverageTable {
    pub fn for_category(&self, category: GarmentCategory) -> CoverageRatio {
        match category {
            GarmentCategory::UpperBody => self.upper_body,
            GarmentCategory::LowerBody => self.lower_body,
            GarmentCategory::Dress => self.dress,
        }
    }
}

impl Default for CoverageTable {
    fn default() -> Self {
        Self {
            upper_body: CoverageRatio::clamped(0.5),
            lower_body: CoverageRatio::clamped(0.6),
            dress: CoverageRatio::clamped(0.85),
        }
    }
}

/// Options for the disclaimer stamper.
#[derive(Debug, Clone)]
pub struct StampOptions {
    /// Text drawn near the bottom edge. Empty disables stamping.
    pub text: String,
    /// Font file tried before the candidates.
    pub font_path: Option<PathBuf>,
    /// System fonts tried in order when `font_path` is unset or unreadable.
    pub font_candidates: Vec<PathBuf>,
    /// Distance in pixels between the text and the bottom edge.
    pub bottom_margin: u32,
    /// Smallest font size in pixels.
    pub min_font_px: f32,
    /// Font size as a fraction of the image height.
    pub font_height_fraction: f32,
}

impl StampOptions {
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_font_path(mut self, font_path: Option<PathBuf>) -> Self {
        self.font_path = font_path;
        self
    }

    /// Font size in pixels for an image of the given height.
    pub fn font_px(&self, image_height: u32) -> f32 {
        (image_height as f32 * self.font_height_fraction).max(self.min_font_px)
    }
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            text: DEFAULT_DISCLAIMER.to_string(),
            font_path: None,
            font_candidates: default_font_candidates(),
            bottom_margin: 20,
            min_font_px: 16.0,
            font_height_fraction: 0.025,
        }
    }
}

/// CJK-capable fonts first, then common Latin fallbacks.
fn default_font_candidates() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
        "/System/Library/Fonts/PingFang.ttc",
        "C:\\Windows\\Fonts\\msjh.ttc",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/System/Library/Fonts/Helvetica.ttc",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

/// Configuration handed to [`crate::TryOnPipeline`] at construction.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Whether the overlay compositor may run when generation yields nothing.
    pub fallback_enabled: bool,
    pub compose: ComposeOptions,
    pub garment_prep: GarmentPrep,
    /// Coverage applied when the garment has none. `None` keeps the
    /// shoulder-width sizing rule.
    pub default_coverage: Option<CoverageTable>,
    pub stamp: StampOptions,
    /// JPEG quality of the final encoding (1-100).
    pub jpeg_quality: u8,
    /// Keywords used to infer a category from a garment's display name.
    pub category_keywords: CategoryKeywords,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            compose: ComposeOptions::default(),
            garment_prep: GarmentPrep::default(),
            default_coverage: None,
            stamp: StampOptions::default(),
            jpeg_quality: 90,
            category_keywords: CategoryKeywords::default(),
        }
    }
}

impl PipelineConfig {
    /// Enable or disable the overlay fallback.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    /// Set the compositor options.
    pub fn with_compose_options(mut self, compose: ComposeOptions) -> Self {
        self.compose = compose;
        self
    }

    /// Set the garment normalization options.
    pub fn with_garment_prep(mut self, garment_prep: GarmentPrep) -> Self {
        self.garment_prep = garment_prep;
        self
    }

    /// Apply a per-category coverage table to garments without an explicit ratio.
    pub fn with_default_coverage(mut self, table: Option<CoverageTable>) -> Self {
        self.default_coverage = table;
        self
    }

    /// Set the disclaimer stamper options.
    pub fn with_stamp_options(mut self, stamp: StampOptions) -> Self {
        self.stamp = stamp;
        self
    }

    /// Set the JPEG quality, clamped to 1-100.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Replace the name-inference keyword table.
    pub fn with_category_keywords(mut self, keywords: CategoryKeywords) -> Self {
        self.category_keywords = keywords;
        self
    }
}

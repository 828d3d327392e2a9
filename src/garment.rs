//! Garment categories, coverage ratios and routing hints.

use serde::Deserialize;

use crate::{TryOnError, TryOnResult};

/// Body region a garment covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GarmentCategory {
    UpperBody,
    LowerBody,
    Dress,
}

impl GarmentCategory {
    /// Parse an explicit category string as stored in the catalog.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "upper_body" | "upper" | "top" | "tops" => Some(Self::UpperBody),
            "lower_body" | "lower" | "bottom" | "bottoms" => Some(Self::LowerBody),
            "dress" | "dresses" => Some(Self::Dress),
            _ => None,
        }
    }

    /// Legacy fallback: guess the category from a display name.
    ///
    /// Dress keywords win over lower-body keywords; anything unmatched is upper-body.
    pub fn infer_from_name(name: &str, keywords: &CategoryKeywords) -> Self {
        let lowered = name.to_lowercase();
        let contains_any = |words: &[String]| words.iter().any(|w| lowered.contains(w.as_str()));

        if contains_any(keywords.dress.as_slice()) {
            Self::Dress
        } else if contains_any(keywords.lower_body.as_slice()) {
            Self::LowerBody
        } else {
            Self::UpperBody
        }
    }

    /// Use the explicit category when it parses, otherwise infer from the name.
    pub fn resolve(explicit: Option<&str>, name: &str, keywords: &CategoryKeywords) -> Self {
        match explicit.and_then(Self::parse) {
            Some(category) => category,
            None => {
                if let Some(raw) = explicit {
                    tracing::debug!(category = raw, "unrecognized category, inferring from name");
                }
                Self::infer_from_name(name, keywords)
            }
        }
    }

    /// Label understood by hosted try-on models.
    pub fn service_label(self) -> &'static str {
        match self {
            Self::UpperBody => "upper_body",
            Self::LowerBody => "lower_body",
            Self::Dress => "dresses",
        }
    }
}

/// Lowercase substrings used by [`GarmentCategory::infer_from_name`].
#[derive(Debug, Clone)]
pub struct CategoryKeywords {
    pub dress: Vec<String>,
    pub lower_body: Vec<String>,
}

impl Default for CategoryKeywords {
    fn default() -> Self {
        let owned =
            |words: &[&str]| -> Vec<String> { words.iter().map(|w| (*w).to_string()).collect() };
        Self {
            dress: owned(&["dress", "skirt", "gown", "裙"]),
            lower_body: owned(&[
                "pants", "trousers", "jeans", "shorts", "leggings", "褲", "裤",
            ]),
        }
    }
}

/// Fraction of the person image height a garment should span, in (0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct CoverageRatio(f32);

impl CoverageRatio {
    pub fn new(value: f32) -> TryOnResult<Self> {
        if value.is_finite() && value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(TryOnError::InvalidCoverage(value))
        }
    }

    /// Force a value into (0, 1]. Non-finite input becomes 1.0.
    pub fn clamped(value: f32) -> Self {
        if value.is_finite() {
            Self(value.clamp(f32::MIN_POSITIVE, 1.0))
        } else {
            Self(1.0)
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

/// Which stages a try-on request may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TryOnMethod {
    /// Generative service first, overlay fallback after.
    #[default]
    Auto,
    /// Generative service only.
    Generative,
    /// Overlay compositor only.
    Overlay,
}

impl TryOnMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "generative" | "ai" | "vton" => Some(Self::Generative),
            "overlay" | "paste" | "2d" => Some(Self::Overlay),
            _ => None,
        }
    }

    pub fn allows_generative(self) -> bool {
        matches!(self, Self::Auto | Self::Generative)
    }

    pub fn allows_overlay(self) -> bool {
        matches!(self, Self::Auto | Self::Overlay)
    }
}

/// Everything the pipeline needs to know about a garment besides its pixels.
#[derive(Debug, Clone)]
pub struct GarmentDescriptor {
    pub name: String,
    pub category: GarmentCategory,
    pub coverage: Option<CoverageRatio>,
    pub method: TryOnMethod,
}

impl GarmentDescriptor {
    pub fn new(name: impl Into<String>, category: GarmentCategory) -> Self {
        Self {
            name: name.into(),
            category,
            coverage: None,
            method: TryOnMethod::Auto,
        }
    }

    pub fn with_coverage(mut self, coverage: Option<CoverageRatio>) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn with_method(mut self, method: TryOnMethod) -> Self {
        self.method = method;
        self
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use tryon::{BodyLandmarks, StampOptions, TryOnResult};

use crate::cli::GlobalOptions;

/// Stamp options with the global font override applied.
pub fn stamp_options(global: &GlobalOptions, text: Option<&str>) -> StampOptions {
    let options = StampOptions::default().with_font_path(global.font.clone());
    match text {
        Some(text) => options.with_text(text),
        None => options,
    }
}

/// Read landmarks from a JSON file, tolerating the same noise as oracle replies.
pub fn read_landmarks(path: &Path) -> TryOnResult<BodyLandmarks> {
    let text = fs::read_to_string(path)?;
    BodyLandmarks::from_oracle_response(&text)
}

/// Derive a variant file path by appending a suffix before the extension.
pub fn derive_variant_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let mut derived = input.to_path_buf();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| suffix.to_string());
    let filename = format!("{}-{}.{}", stem, suffix, extension);
    derived.set_file_name(filename);
    derived
}

/// Extension of `input`, lowercased, or `fallback` when it has none.
pub fn extension_or(input: &Path, fallback: &str) -> String {
    input
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_else(|| fallback.to_string())
}

use thiserror::Error;

/// Result type alias for operations that may fail with [`TryOnError`].
pub type TryOnResult<T> = std::result::Result<T, TryOnError>;

/// Which input an image-level error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Person,
    Garment,
    Generated,
}

impl std::fmt::Display for ImageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ImageRole::Person => "person",
            ImageRole::Garment => "garment",
            ImageRole::Generated => "generated",
        };
        f.write_str(label)
    }
}

/// Error types that can occur while producing a try-on image.
///
/// Decode failures and [`TryOnError::GenerationFailed`] are terminal for a request.
/// Oracle and rendering failures are recovered inside the pipeline and only
/// show up here when a caller invokes those components directly.
#[derive(Debug, Error)]
pub enum TryOnError {
    /// Input bytes could not be decoded as an image.
    #[error("Failed to decode {role} image: {source}")]
    Decode {
        role: ImageRole,
        #[source]
        source: image::ImageError,
    },
    /// Decoded image has a zero width or height.
    #[error("The {role} image has no pixels")]
    EmptyImage { role: ImageRole },
    /// Image encoding or saving error.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
    /// File system I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Catalog or oracle JSON could not be parsed.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// No catalog entry with the requested id.
    #[error("Garment not found in catalog: {id}")]
    GarmentNotFound { id: String },
    /// Coverage ratio outside (0, 1].
    #[error("Coverage ratio {0} is outside (0, 1]")]
    InvalidCoverage(f32),
    /// Landmark oracle response carried no usable data.
    #[error("Landmark oracle response is unusable: {0}")]
    Oracle(String),
    /// Text rendering failed.
    #[error("Disclaimer rendering failed: {0}")]
    Render(String),
    /// Every enabled stage ran without producing an image.
    #[error("Try-on generation failed: {reason}")]
    GenerationFailed { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_names_the_role() {
        let source = image::ImageError::IoError(std::io::Error::other("truncated"));
        let err = TryOnError::Decode {
            role: ImageRole::Garment,
            source,
        };
        let msg = err.to_string();
        assert!(msg.contains("garment"));
        assert!(msg.contains("truncated"));
    }

    #[test]
    fn generation_failed_is_distinct_from_decode() {
        let err = TryOnError::GenerationFailed {
            reason: "fallback disabled".to_string(),
        };
        assert!(matches!(err, TryOnError::GenerationFailed { .. }));
        assert!(err.to_string().contains("fallback disabled"));
    }

    #[test]
    fn invalid_coverage_message() {
        let msg = TryOnError::InvalidCoverage(1.5).to_string();
        assert!(msg.contains("1.5"));
    }
}

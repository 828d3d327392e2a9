use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};

use crate::error::ImageRole;
use crate::{TryOnError, TryOnResult};

/// Decode an in-memory image, rejecting zero-sized results.
pub fn decode(bytes: &[u8], role: ImageRole) -> TryOnResult<DynamicImage> {
    let image =
        image::load_from_memory(bytes).map_err(|source| TryOnError::Decode { role, source })?;
    if image.width() == 0 || image.height() == 0 {
        return Err(TryOnError::EmptyImage { role });
    }
    tracing::debug!(%role, width = image.width(), height = image.height(), "decoded image");
    Ok(image)
}

/// Encode an opaque image as baseline JPEG.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> TryOnResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality.clamp(1, 100));
    image.write_with_encoder(encoder)?;
    Ok(bytes)
}

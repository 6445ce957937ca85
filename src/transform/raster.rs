// src/transform/raster.rs - Raster image decoding
use spoolprep_shared::ElementKind;

use crate::error::PrepareError;
use crate::output::RasterImage;

/// Decode PNG/JPEG/GIF/BMP bytes, sniffing the format from the content.
pub fn decode(bytes: &[u8]) -> Result<RasterImage, PrepareError> {
    if bytes.is_empty() {
        return Err(PrepareError::invalid_source(ElementKind::Image, "empty image data"));
    }
    let format = image::guess_format(bytes)
        .map_err(|e| PrepareError::invalid_source(ElementKind::Image, format!("unrecognized image format: {}", e)))?;
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PrepareError::invalid_source(ElementKind::Image, e.to_string()))?;
    tracing::debug!("Decoded {:?} image {}x{}", format, decoded.width(), decoded.height());
    Ok(RasterImage::new(decoded))
}

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat};

use crate::error::PipelineError;
use crate::normalize::NormalizedImage;

/// Decode raster bytes (JPEG/PNG) into an in-memory image.
pub fn decode_raster(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    image::load_from_memory(bytes)
        .map_err(|e| PipelineError::Decode(format!("unreadable raster data: {e}")))
}

/// Serialize a normalized image to JPEG bytes.
pub fn encode_jpeg(image: &NormalizedImage) -> Result<Vec<u8>, PipelineError> {
    let dynamic = image.to_dynamic_image()?;
    let mut buffer = Vec::new();
    dynamic
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .map_err(|e| PipelineError::Io(format!("JPEG encoding failed: {e}")))?;
    Ok(buffer)
}

/// Write a normalized image to disk; the format follows the target extension.
pub fn save(image: &NormalizedImage, output: &Path) -> Result<(), PipelineError> {
    let dynamic = image.to_dynamic_image()?;
    dynamic
        .save(output)
        .map_err(|e| PipelineError::Io(format!("failed to save image to {output:?}: {e}")))
}

use image::{ImageFormat, RgbImage};
use std::path::Path;

use crate::error::PipelineError;

const ALLOWED_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png];

/// Decode uploaded or captured bytes into an RGB8 pixel grid.
///
/// Only JPEG and PNG are accepted. Alpha and grayscale inputs are converted,
/// so callers always see three channels in RGB order.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, PipelineError> {
    let format = image::guess_format(bytes)
        .map_err(|_| PipelineError::UnsupportedFormat("unrecognized header".to_string()))?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(PipelineError::UnsupportedFormat(format!("{:?}", format)));
    }

    let img = image::load_from_memory_with_format(bytes, format)?;
    Ok(img.to_rgb8())
}

/// Read and decode an image file.
pub fn load_image(path: &Path) -> anyhow::Result<RgbImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| anyhow::anyhow!("Failed to read image {}: {}", path.display(), e))?;
    Ok(decode_image(&bytes)?)
}

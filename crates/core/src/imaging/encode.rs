use std::io::Cursor;
use std::path::Path;

use crate::shared::frame::Frame;

use super::{to_rgb_image, ImagingError};

/// Encode a frame as PNG bytes (lossless, used for upload responses).
pub fn encode_png(frame: &Frame) -> Result<Vec<u8>, ImagingError> {
    let img = to_rgb_image(frame)?;
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(ImagingError::Encode)?;
    Ok(bytes)
}

/// Encode a frame as JPEG bytes (used for the MJPEG live stream).
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, ImagingError> {
    let img = to_rgb_image(frame)?;
    let mut bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality);
    img.write_with_encoder(encoder)
        .map_err(ImagingError::Encode)?;
    Ok(bytes)
}

/// Write a frame to disk; the format follows the file extension.
pub fn save(path: &Path, frame: &Frame) -> Result<(), ImagingError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ImagingError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let img = to_rgb_image(frame)?;
    img.save(path).map_err(ImagingError::Encode)?;
    Ok(())
}

use std::path::Path;

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

use super::ImagingError;

/// Decode arbitrary user-supplied bytes into an RGB frame.
///
/// Alpha channels and palettes are flattened to RGB; undecodable input is
/// an error, never a panic.
pub fn decode(bytes: &[u8]) -> Result<Frame, ImagingError> {
    let img = image::load_from_memory(bytes)
        .map_err(ImagingError::Decode)?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 0))
}

/// Load a frame from disk, gating on the accepted extensions first.
pub fn load(path: &Path) -> Result<Frame, ImagingError> {
    if !is_supported(path) {
        return Err(ImagingError::UnsupportedFormat);
    }
    let bytes = std::fs::read(path).map_err(|source| ImagingError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&bytes)
}

/// Whether the path carries one of the accepted upload extensions.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

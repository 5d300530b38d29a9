//! Image adapter: everything between user-supplied bytes and [`Frame`]s.
//!
//! Decode and encode go through the `image` crate; the detection layer
//! never sees anything but RGB frames.

pub mod decode;
pub mod encode;
pub mod resize;

use std::path::PathBuf;

use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported image format (accepted: jpg, jpeg, png)")]
    UnsupportedFormat,
    #[error("frame buffer does not match its dimensions")]
    InvalidFrame,
}

/// Frame → `image` crate buffer. Fails only if the frame invariant
/// (len == w*h*3) was broken, which `Frame::new` debug-asserts against.
pub(crate) fn to_rgb_image(frame: &Frame) -> Result<image::RgbImage, ImagingError> {
    image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or(ImagingError::InvalidFrame)
}

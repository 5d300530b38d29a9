//! Camera frame sources.
//!
//! `CameraSource` resolves a device path into one of two backends:
//! a synthetic test-pattern generator for `synthetic:` paths (always
//! compiled, used by tests and camera-less demos) and a V4L2 device
//! backend behind the `live-camera` feature.

use std::time::{Duration, Instant};

use crate::shared::constants::{CAMERA_FPS, CAMERA_HEIGHT, CAMERA_WIDTH};
use crate::shared::frame::Frame;
use crate::stream::frame_source::FrameSource;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("camera support not compiled in (enable the `live-camera` feature)")]
    NotCompiled,
    #[error("failed to open camera {device}: {message}")]
    Open { device: String, message: String },
    #[error("camera {device} delivers unsupported pixel format {fourcc}")]
    UnsupportedFormat { device: String, fourcc: String },
    #[error("camera not connected")]
    NotConnected,
    #[error("capture failed: {0}")]
    Capture(String),
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device path (`/dev/video0`), or `synthetic:` for the test pattern.
    pub device: String,
    pub width: u32,
    pub height: u32,
    /// Target frame rate; 0 disables pacing (tests).
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: CAMERA_WIDTH,
            height: CAMERA_HEIGHT,
            fps: CAMERA_FPS,
        }
    }
}

pub struct CameraSource {
    backend: Backend,
}

enum Backend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "live-camera")]
    Device(v4l2::DeviceCamera),
}

impl CameraSource {
    /// Build a source for the configured device path.
    ///
    /// Real device paths require the `live-camera` feature; without it
    /// only `synthetic:` paths are accepted, so front-ends can show the
    /// no-hardware placeholder instead of failing later.
    pub fn new(config: CameraConfig) -> Result<Self, CameraError> {
        if config.device.starts_with("synthetic:") {
            return Ok(Self {
                backend: Backend::Synthetic(SyntheticCamera::new(config)),
            });
        }
        #[cfg(feature = "live-camera")]
        {
            Ok(Self {
                backend: Backend::Device(v4l2::DeviceCamera::new(config)),
            })
        }
        #[cfg(not(feature = "live-camera"))]
        {
            Err(CameraError::NotCompiled)
        }
    }
}

impl FrameSource for CameraSource {
    fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        match &mut self.backend {
            Backend::Synthetic(camera) => camera.connect(),
            #[cfg(feature = "live-camera")]
            Backend::Device(camera) => camera.connect(),
        }
    }

    fn next_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        match &mut self.backend {
            Backend::Synthetic(camera) => camera.next_frame(),
            #[cfg(feature = "live-camera")]
            Backend::Device(camera) => camera.next_frame(),
        }
    }

    fn close(&mut self) {
        match &mut self.backend {
            Backend::Synthetic(camera) => camera.close(),
            #[cfg(feature = "live-camera")]
            Backend::Device(camera) => camera.close(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic camera (synthetic:) for tests and camera-less demos
// ----------------------------------------------------------------------------

struct SyntheticCamera {
    config: CameraConfig,
    frame_count: usize,
    last_frame_at: Option<Instant>,
}

impl SyntheticCamera {
    fn new(config: CameraConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            last_frame_at: None,
        }
    }

    fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        log::info!("camera: connected to {} (synthetic)", self.config.device);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        self.pace();
        let frame = Frame::new(
            synthetic_pixels(self.config.width, self.config.height, self.frame_count),
            self.config.width,
            self.config.height,
            self.frame_count,
        );
        self.frame_count += 1;
        Ok(frame)
    }

    /// Sleep out the remainder of the frame interval, so synthetic
    /// streams run at camera speed instead of saturating a core.
    fn pace(&mut self) {
        if self.config.fps == 0 {
            return;
        }
        let interval = Duration::from_secs_f64(1.0 / self.config.fps as f64);
        if let Some(last) = self.last_frame_at {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last_frame_at = Some(Instant::now());
    }

    fn close(&mut self) {}
}

/// A moving diagonal gradient: deterministic per (size, frame index).
fn synthetic_pixels(width: u32, height: u32, index: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let base = (x + y + index as u32) % 256;
            pixels.push(base as u8);
            pixels.push((base / 2) as u8);
            pixels.push((255 - base) as u8);
        }
    }
    pixels
}

// ----------------------------------------------------------------------------
// V4L2 device camera
// ----------------------------------------------------------------------------

#[cfg(feature = "live-camera")]
mod v4l2 {
    use super::*;

    pub(super) struct DeviceCamera {
        config: CameraConfig,
        state: Option<CaptureState>,
        fourcc: [u8; 4],
        active_width: u32,
        active_height: u32,
        frame_count: usize,
    }

    #[ouroboros::self_referencing]
    struct CaptureState {
        device: v4l::Device,
        #[borrows(mut device)]
        #[covariant]
        stream: v4l::prelude::MmapStream<'this, v4l::Device>,
    }

    impl DeviceCamera {
        pub(super) fn new(config: CameraConfig) -> Self {
            Self {
                active_width: config.width,
                active_height: config.height,
                config,
                state: None,
                fourcc: *b"RGB3",
                frame_count: 0,
            }
        }

        pub(super) fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            use v4l::buffer::Type;
            use v4l::video::Capture;

            let mut device = v4l::Device::with_path(&self.config.device).map_err(|e| {
                CameraError::Open {
                    device: self.config.device.clone(),
                    message: e.to_string(),
                }
            })?;

            let mut format = device.format()?;
            format.width = self.config.width;
            format.height = self.config.height;
            format.fourcc = v4l::FourCC::new(b"RGB3");
            let format = match device.set_format(&format) {
                Ok(format) => format,
                Err(err) => {
                    log::warn!(
                        "camera: failed to set format on {}: {err}",
                        self.config.device
                    );
                    device.format()?
                }
            };

            let fourcc = format.fourcc.repr;
            if &fourcc != b"RGB3" && &fourcc != b"YUYV" {
                return Err(CameraError::UnsupportedFormat {
                    device: self.config.device.clone(),
                    fourcc: String::from_utf8_lossy(&fourcc).into_owned(),
                }
                .into());
            }

            if self.config.fps > 0 {
                let params = v4l::video::capture::Parameters::with_fps(self.config.fps);
                if let Err(err) = device.set_params(&params) {
                    log::warn!("camera: failed to set fps on {}: {err}", self.config.device);
                }
            }

            self.active_width = format.width;
            self.active_height = format.height;
            self.fourcc = fourcc;

            let state = CaptureStateBuilder {
                device,
                stream_builder: |device| {
                    v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                },
            }
            .try_build()?;
            self.state = Some(state);

            log::info!(
                "camera: connected to {} ({}x{} {})",
                self.config.device,
                self.active_width,
                self.active_height,
                String::from_utf8_lossy(&self.fourcc)
            );
            Ok(())
        }

        pub(super) fn next_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
            use v4l::io::traits::CaptureStream;

            let state = self.state.as_mut().ok_or(CameraError::NotConnected)?;
            let width = self.active_width;
            let height = self.active_height;
            let fourcc = self.fourcc;

            let rgb = state.with_stream_mut(|stream| {
                let (buf, _meta) = stream
                    .next()
                    .map_err(|e| CameraError::Capture(e.to_string()))?;
                match &fourcc {
                    b"RGB3" => rgb3_pixels(buf, width, height),
                    b"YUYV" => yuyv_to_rgb(buf, width, height),
                    _ => unreachable!("format checked at connect"),
                }
            })?;

            let frame = Frame::new(rgb, width, height, self.frame_count);
            self.frame_count += 1;
            Ok(frame)
        }

        pub(super) fn close(&mut self) {
            self.state = None;
        }
    }

    fn rgb3_pixels(buf: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CameraError> {
        let expected = (width * height * 3) as usize;
        if buf.len() < expected {
            return Err(CameraError::Capture(format!(
                "RGB frame too short: expected {expected}, got {}",
                buf.len()
            )));
        }
        Ok(buf[..expected].to_vec())
    }

    /// YUYV 4:2:2 → packed RGB, BT.601 coefficients.
    fn yuyv_to_rgb(buf: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CameraError> {
        let w = width as usize;
        let h = height as usize;
        let expected = w * h * 2;
        if buf.len() < expected {
            return Err(CameraError::Capture(format!(
                "YUYV frame too short: expected {expected}, got {}",
                buf.len()
            )));
        }

        let mut rgb = vec![0u8; w * h * 3];
        for i in 0..(w * h / 2) {
            let off = i * 4;
            let y0 = buf[off] as f32;
            let u = buf[off + 1] as f32 - 128.0;
            let y1 = buf[off + 2] as f32;
            let v = buf[off + 3] as f32 - 128.0;

            for (slot, y) in [(0usize, y0), (1usize, y1)] {
                let r = y + 1.402 * v;
                let g = y - 0.344_136 * u - 0.714_136 * v;
                let b = y + 1.772 * u;
                let out = (i * 2 + slot) * 3;
                rgb[out] = clamp_to_u8(r);
                rgb[out + 1] = clamp_to_u8(g);
                rgb[out + 2] = clamp_to_u8(b);
            }
        }
        Ok(rgb)
    }

    fn clamp_to_u8(value: f32) -> u8 {
        value.round().clamp(0.0, 255.0) as u8
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_yuyv_neutral_chroma_is_gray() {
            // 2x1 YUYV with Y=128, U=V=128 → gray pixels
            let buf = [128u8, 128, 128, 128];
            let rgb = yuyv_to_rgb(&buf, 2, 1).unwrap();
            assert_eq!(rgb, vec![128u8; 6]);
        }

        #[test]
        fn test_yuyv_short_buffer_is_error() {
            assert!(yuyv_to_rgb(&[0u8; 4], 4, 4).is_err());
        }

        #[test]
        fn test_rgb3_truncates_driver_padding() {
            let buf = vec![7u8; 2 * 1 * 3 + 16];
            let rgb = rgb3_pixels(&buf, 2, 1).unwrap();
            assert_eq!(rgb.len(), 6);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_config() -> CameraConfig {
        CameraConfig {
            device: "synthetic:".to_string(),
            width: 64,
            height: 48,
            fps: 0,
        }
    }

    #[test]
    fn test_synthetic_source_produces_sized_frames() {
        let mut source = CameraSource::new(synthetic_config()).unwrap();
        source.connect().unwrap();
        let frame = source.next_frame().unwrap();
        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
        assert_eq!(frame.data().len(), 64 * 48 * 3);
        source.close();
    }

    #[test]
    fn test_synthetic_frames_are_indexed() {
        let mut source = CameraSource::new(synthetic_config()).unwrap();
        source.connect().unwrap();
        assert_eq!(source.next_frame().unwrap().index(), 0);
        assert_eq!(source.next_frame().unwrap().index(), 1);
        assert_eq!(source.next_frame().unwrap().index(), 2);
    }

    #[test]
    fn test_synthetic_frames_change_over_time() {
        let mut source = CameraSource::new(synthetic_config()).unwrap();
        source.connect().unwrap();
        let a = source.next_frame().unwrap();
        let b = source.next_frame().unwrap();
        assert_ne!(a.data(), b.data());
    }

    #[cfg(not(feature = "live-camera"))]
    #[test]
    fn test_device_path_requires_feature() {
        let config = CameraConfig::default();
        assert!(matches!(
            CameraSource::new(config),
            Err(CameraError::NotCompiled)
        ));
    }

    #[test]
    fn test_default_config_matches_camera_constants() {
        let config = CameraConfig::default();
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 480);
        assert_eq!(config.fps, 30);
    }
}

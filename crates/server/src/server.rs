//! The accept loop and routing.
//!
//! One connection at a time: each is handled to completion before the
//! next is accepted, matching the one-interaction-at-a-time model of the
//! UI. The live stream holds its connection until the client disconnects
//! or the camera fails.

use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use facemark_core::detection::domain::mesh_detector::MeshDetector;
use facemark_core::imaging::encode;
use facemark_core::pipeline::detect_image_use_case::DetectImageUseCase;
use facemark_core::shared::constants::MAX_IMAGE_DIMENSION;
use facemark_core::stream::camera::{CameraConfig, CameraSource};
use facemark_core::stream::frame_source::FrameSource;
use facemark_core::stream::live_session::{FrameProcessor, LiveEvent, LiveSession};

use crate::config::ServerConfig;
use crate::handlers;
use crate::http::{self, HttpRequest};
use crate::page::{self, PageMode};

/// Builds a fresh detector per interaction; sessions never outlive one
/// request.
pub type DetectorFactory = Arc<dyn Fn() -> Box<dyn MeshDetector> + Send + Sync>;

pub struct Server {
    config: ServerConfig,
    detector_factory: DetectorFactory,
    requests_served: AtomicU64,
}

impl Server {
    pub fn new(config: ServerConfig, detector_factory: DetectorFactory) -> Self {
        Self {
            config,
            detector_factory,
            requests_served: AtomicU64::new(0),
        }
    }

    /// Bind the loopback listener on the configured port.
    pub fn bind(&self) -> std::io::Result<(TcpListener, SocketAddr)> {
        let listener = TcpListener::bind(("127.0.0.1", self.config.port))?;
        let addr = listener.local_addr()?;
        Ok((listener, addr))
    }

    /// Serve forever. Connection-level failures are logged, not fatal.
    pub fn run(&self, listener: TcpListener) -> std::io::Result<()> {
        loop {
            let (stream, peer) = listener.accept()?;
            if let Err(err) = self.handle_connection(stream) {
                log::warn!("request from {peer} failed: {err}");
            }
            self.count_request();
        }
    }

    fn handle_connection(&self, mut stream: TcpStream) -> Result<(), Box<dyn std::error::Error>> {
        stream.set_read_timeout(Some(std::time::Duration::from_secs(10)))?;
        let request = match http::read_request(&mut stream) {
            Ok(request) => request,
            Err(err) => {
                http::write_json(
                    &mut stream,
                    400,
                    &serde_json::json!({ "message": err }).to_string(),
                )?;
                return Ok(());
            }
        };
        log::debug!("{} {}", request.method, request.path);

        match (request.method.as_str(), request.path.as_str()) {
            ("GET", "/") => self.serve_page(&mut stream, &request),
            ("POST", "/api/detect") => self.serve_detect(&mut stream, &request),
            ("GET", "/api/stream") => self.serve_stream(&mut stream),
            ("GET", "/health") => {
                let (status, body) = handlers::handle_health();
                Ok(http::write_json(&mut stream, status, &body)?)
            }
            (_, "/" | "/api/detect" | "/api/stream" | "/health") => {
                let (status, body) = handlers::method_not_allowed();
                Ok(http::write_json(&mut stream, status, &body)?)
            }
            _ => {
                let (status, body) = handlers::not_found();
                Ok(http::write_json(&mut stream, status, &body)?)
            }
        }
    }

    fn serve_page(
        &self,
        stream: &mut TcpStream,
        request: &HttpRequest,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mode = PageMode::from_query(request.query_param("mode"));
        let html = page::render(mode, self.live_available());
        Ok(http::write_html(stream, 200, &html)?)
    }

    fn serve_detect(
        &self,
        stream: &mut TcpStream,
        request: &HttpRequest,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut use_case =
            DetectImageUseCase::new((self.detector_factory)(), MAX_IMAGE_DIMENSION);
        let (status, body) = handlers::handle_detect(&request.body, &mut use_case);
        Ok(http::write_json(stream, status, &body)?)
    }

    /// GET /api/stream: MJPEG until the client goes away or the camera
    /// fails. Each frame runs the full detect-and-draw sequence.
    fn serve_stream(&self, stream: &mut TcpStream) -> Result<(), Box<dyn std::error::Error>> {
        let source = match CameraSource::new(self.camera_config()) {
            Ok(source) => source,
            Err(err) => {
                let (status, body) = handlers::camera_unavailable(&err.to_string());
                return Ok(http::write_json(stream, status, &body)?);
            }
        };

        let mut use_case =
            DetectImageUseCase::new((self.detector_factory)(), MAX_IMAGE_DIMENSION);
        let processor: FrameProcessor =
            Box::new(move |frame| use_case.execute(frame).map(|outcome| outcome.annotated));

        let (session, events) = match LiveSession::start(Box::new(source) as Box<dyn FrameSource>, processor)
        {
            Ok(started) => started,
            Err(err) => {
                log::warn!("camera connect failed: {err}");
                let (status, body) = handlers::camera_unavailable(&err.to_string());
                return Ok(http::write_json(stream, status, &body)?);
            }
        };

        stream.write_all(
            b"HTTP/1.1 200 OK\r\nContent-Type: multipart/x-mixed-replace; boundary=frame\r\nConnection: close\r\n\r\n",
        )?;

        for event in events.iter() {
            match event {
                LiveEvent::Frame(frame) => {
                    let jpeg = match encode::encode_jpeg(&frame, 80) {
                        Ok(jpeg) => jpeg,
                        Err(err) => {
                            log::warn!("could not encode stream frame: {err}");
                            continue;
                        }
                    };
                    if write_mjpeg_part(stream, &jpeg).is_err() {
                        // Client disconnected; stop the stream
                        break;
                    }
                }
                LiveEvent::Error(message) => {
                    log::debug!("live frame skipped: {message}");
                }
                LiveEvent::Stopped => break,
            }
        }

        session.stop();
        Ok(())
    }

    fn live_available(&self) -> bool {
        CameraSource::new(self.camera_config()).is_ok()
    }

    fn camera_config(&self) -> CameraConfig {
        CameraConfig {
            device: self.config.camera_device.clone(),
            ..CameraConfig::default()
        }
    }

    fn count_request(&self) {
        let served = self.requests_served.fetch_add(1, Ordering::Relaxed) + 1;
        if self.config.telemetry && served % 10 == 0 {
            log::info!("usage: {served} requests served");
        }
    }
}

fn write_mjpeg_part(stream: &mut TcpStream, jpeg: &[u8]) -> std::io::Result<()> {
    write!(
        stream,
        "--frame\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        jpeg.len()
    )?;
    stream.write_all(jpeg)?;
    stream.write_all(b"\r\n")?;
    stream.flush()
}

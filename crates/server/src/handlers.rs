//! Route handlers that don't need the raw socket.
//!
//! Each returns `(status, JSON body)`; the server loop writes them out.

use base64::Engine;
use serde::Serialize;

use facemark_core::imaging::{decode, encode};
use facemark_core::pipeline::detect_image_use_case::DetectImageUseCase;
use facemark_core::shared::constants::TOTAL_LANDMARKS;

/// Decode failure: the interaction halts, the user picks another file.
pub const DECODE_ERROR_MESSAGE: &str =
    "Could not read that image. Make sure it is a valid JPG, JPEG or PNG file and try again.";

/// Detection ran but found nothing; the user may retry with another photo.
pub const NO_FACE_MESSAGE: &str = "No face detected. Tips: make sure the face is well lit, \
looking toward the camera, and try a higher-quality image.";

/// The model itself failed.
pub const DETECTION_ERROR_MESSAGE: &str =
    "Landmark detection failed. Try again with a different photo.";

#[derive(Serialize)]
struct DetectResponse {
    success: bool,
    face_count: usize,
    landmark_count: usize,
    total_landmarks: usize,
    coverage_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotated: Option<String>,
}

/// POST /api/detect: body is the raw image upload.
pub fn handle_detect(body: &[u8], use_case: &mut DetectImageUseCase) -> (u16, String) {
    let frame = match decode::decode(body) {
        Ok(frame) => frame,
        Err(err) => {
            log::warn!("upload rejected: {err}");
            return (422, error_json(DECODE_ERROR_MESSAGE));
        }
    };

    let outcome = match use_case.execute(frame) {
        Ok(outcome) => outcome,
        Err(err) => {
            log::error!("detection failed: {err}");
            return (502, error_json(DETECTION_ERROR_MESSAGE));
        }
    };

    let summary = outcome.summary;
    if !summary.success {
        let response = DetectResponse {
            success: false,
            face_count: summary.face_count,
            landmark_count: summary.landmark_count,
            total_landmarks: TOTAL_LANDMARKS,
            coverage_percent: summary.coverage_percent(),
            message: Some(NO_FACE_MESSAGE.to_string()),
            annotated: None,
        };
        return (200, to_json(&response));
    }

    let png = match encode::encode_png(&outcome.annotated) {
        Ok(png) => png,
        Err(err) => {
            log::error!("could not encode annotated frame: {err}");
            return (500, error_json(DETECTION_ERROR_MESSAGE));
        }
    };
    let data_url = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&png)
    );

    let response = DetectResponse {
        success: true,
        face_count: summary.face_count,
        landmark_count: summary.landmark_count,
        total_landmarks: TOTAL_LANDMARKS,
        coverage_percent: summary.coverage_percent(),
        message: None,
        annotated: Some(data_url),
    };
    (200, to_json(&response))
}

/// GET /health
pub fn handle_health() -> (u16, String) {
    (200, r#"{"status":"ok"}"#.to_string())
}

pub fn not_found() -> (u16, String) {
    (404, error_json("not found"))
}

pub fn method_not_allowed() -> (u16, String) {
    (405, error_json("method not allowed"))
}

pub fn camera_unavailable(reason: &str) -> (u16, String) {
    (503, error_json(reason))
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "message": message }).to_string()
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| error_json("internal error"))
}

/// Landmarks per face in the full attention mesh (468 mesh + 10 iris).
pub const TOTAL_LANDMARKS: usize = 478;

pub const FACE_FINDER_MODEL_NAME: &str = "blazeface_short_range.onnx";
pub const FACE_FINDER_MODEL_URL: &str =
    "https://github.com/facemark/facemark/releases/download/v0.1.0/blazeface_short_range.onnx";

pub const MESH_MODEL_NAME: &str = "face_landmarks_478.onnx";
pub const MESH_MODEL_URL: &str =
    "https://github.com/facemark/facemark/releases/download/v0.1.0/face_landmarks_478.onnx";

/// Uploaded images are downscaled so neither dimension exceeds this.
pub const MAX_IMAGE_DIMENSION: u32 = 800;

/// Upload formats accepted by every front-end.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Faces processed per frame before the mesh stage stops.
pub const DEFAULT_MAX_FACES: usize = 4;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

pub const CAMERA_WIDTH: u32 = 640;
pub const CAMERA_HEIGHT: u32 = 480;
pub const CAMERA_FPS: u32 = 30;

use crate::detection::domain::landmark::FaceMesh;
use crate::shared::frame::Frame;

/// Domain interface for face-mesh detection.
///
/// Implementations own whatever model state they need between calls,
/// hence `&mut self`. One call analyzes one frame and returns one mesh
/// per detected face, best face first.
pub trait MeshDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceMesh>, Box<dyn std::error::Error>>;
}

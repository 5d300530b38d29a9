use std::time::Instant;

use crate::detection::domain::detection_summary::DetectionSummary;
use crate::detection::domain::landmark::FaceMesh;
use crate::detection::domain::mesh_detector::MeshDetector;
use crate::imaging::resize;
use crate::overlay;
use crate::shared::frame::Frame;

/// Everything one detection call produces, consumed immediately by a
/// front-end and never persisted.
pub struct DetectionOutcome {
    pub original: Frame,
    pub annotated: Frame,
    pub meshes: Vec<FaceMesh>,
    pub summary: DetectionSummary,
}

/// Single-image pipeline: resize-bounded → detect → annotate → summarize.
///
/// The same sequence serves uploads, the CLI, and each live frame; no
/// state survives between calls.
pub struct DetectImageUseCase {
    detector: Box<dyn MeshDetector>,
    max_dimension: u32,
}

impl DetectImageUseCase {
    pub fn new(detector: Box<dyn MeshDetector>, max_dimension: u32) -> Self {
        Self {
            detector,
            max_dimension,
        }
    }

    pub fn execute(&mut self, frame: Frame) -> Result<DetectionOutcome, Box<dyn std::error::Error>> {
        let original = resize::bounded(&frame, self.max_dimension);

        let started = Instant::now();
        let meshes = self.detector.detect(&original)?;
        log::debug!(
            "detection took {:.1}ms, {} face(s)",
            started.elapsed().as_secs_f64() * 1000.0,
            meshes.len()
        );

        let annotated = overlay::annotate(&original, &meshes);
        let summary = DetectionSummary::from_meshes(&meshes);

        Ok(DetectionOutcome {
            original,
            annotated,
            meshes,
            summary,
        })
    }
}

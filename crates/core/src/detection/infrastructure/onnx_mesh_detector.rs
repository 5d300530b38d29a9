use std::path::PathBuf;

use crate::detection::domain::landmark::FaceMesh;
use crate::detection::domain::mesh_detector::MeshDetector;
use crate::detection::infrastructure::onnx_face_finder::OnnxFaceFinder;
use crate::detection::infrastructure::onnx_mesh_regressor::OnnxMeshRegressor;
use crate::shared::constants::{DEFAULT_CONFIDENCE, DEFAULT_MAX_FACES};
use crate::shared::frame::Frame;

/// Configuration for the two-stage ONNX mesh detector.
///
/// Holds resolved model *paths*, not model state: resolution (download,
/// cache) happens once at startup, sessions are per-call.
#[derive(Clone, Debug)]
pub struct MeshDetectorConfig {
    pub face_model: PathBuf,
    pub mesh_model: PathBuf,
    pub confidence: f32,
    pub max_faces: usize,
}

impl MeshDetectorConfig {
    pub fn new(face_model: PathBuf, mesh_model: PathBuf) -> Self {
        Self {
            face_model,
            mesh_model,
            confidence: DEFAULT_CONFIDENCE as f32,
            max_faces: DEFAULT_MAX_FACES,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_max_faces(mut self, max_faces: usize) -> Self {
        self.max_faces = max_faces;
        self
    }

    pub fn build(self) -> OnnxMeshDetector {
        OnnxMeshDetector { config: self }
    }
}

/// Face-mesh facade over the two ONNX stages.
///
/// Each `detect` call acquires fresh model sessions, runs one inference
/// pass, and releases them on every exit path (they are locals, dropped
/// on scope exit). No pooling, batching, or retry.
pub struct OnnxMeshDetector {
    config: MeshDetectorConfig,
}

impl MeshDetector for OnnxMeshDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceMesh>, Box<dyn std::error::Error>> {
        let mut finder = OnnxFaceFinder::new(&self.config.face_model, self.config.confidence)?;
        let mut regressor = OnnxMeshRegressor::new(&self.config.mesh_model)?;

        let boxes = finder.find(frame)?;
        log::debug!("face finder returned {} boxes", boxes.len());

        let mut meshes = Vec::new();
        for face in boxes.iter().take(self.config.max_faces) {
            let mesh = regressor.regress(frame, face)?;
            if mesh.score() >= self.config.confidence && !mesh.is_empty() {
                meshes.push(mesh);
            }
        }

        // Best face first, for the summary's primary-face metrics
        meshes.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(meshes)
    }
}

use crate::detection::domain::landmark::FaceMesh;
use crate::shared::constants::TOTAL_LANDMARKS;

/// Display-facing result flags for one detection call.
///
/// `landmark_count` is the count of the best-scoring face; the face count
/// reports the rest. `success` is true iff at least one face produced
/// landmarks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectionSummary {
    pub success: bool,
    pub face_count: usize,
    pub landmark_count: usize,
}

impl DetectionSummary {
    pub fn from_meshes(meshes: &[FaceMesh]) -> Self {
        let landmark_count = meshes
            .iter()
            .max_by(|a, b| {
                a.score()
                    .partial_cmp(&b.score())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(FaceMesh::len)
            .unwrap_or(0);
        Self {
            success: !meshes.is_empty() && landmark_count > 0,
            face_count: meshes.len(),
            landmark_count,
        }
    }

    /// Landmark coverage as a percentage of the 478-point maximum,
    /// rounded to one decimal.
    pub fn coverage_percent(&self) -> f64 {
        let raw = self.landmark_count as f64 / TOTAL_LANDMARKS as f64 * 100.0;
        (raw * 10.0).round() / 10.0
    }
}

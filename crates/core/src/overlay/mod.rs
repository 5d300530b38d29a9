//! Landmark overlay rendering.
//!
//! Draws each landmark as a small filled dot on a copy of the frame.
//! Dot size scales with the frame so overlays stay readable on both
//! thumbnails and full uploads.

use image::Rgb;

use crate::detection::domain::landmark::FaceMesh;
use crate::shared::frame::Frame;

/// Landmark dot color (MediaPipe-style green).
const DOT_COLOR: Rgb<u8> = Rgb([0, 220, 90]);

/// One dot pixel per ~300px of the frame's short side, minimum 1.
const DOT_SCALE_DIVISOR: u32 = 300;

/// Returns a copy of the frame with every mesh's landmarks drawn on it.
///
/// Landmarks outside the frame are skipped; an empty mesh list returns an
/// unmodified copy.
pub fn annotate(frame: &Frame, meshes: &[FaceMesh]) -> Frame {
    let mut img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .expect("Frame data length must match dimensions");

    let radius = dot_radius(frame.width(), frame.height());
    for mesh in meshes {
        for lm in mesh.landmarks() {
            let x = lm.x.round() as i32;
            let y = lm.y.round() as i32;
            if x < 0 || y < 0 || x >= frame.width() as i32 || y >= frame.height() as i32 {
                continue;
            }
            imageproc::drawing::draw_filled_circle_mut(&mut img, (x, y), radius, DOT_COLOR);
        }
    }

    let (width, height) = img.dimensions();
    Frame::new(img.into_raw(), width, height, frame.index())
}

fn dot_radius(width: u32, height: u32) -> i32 {
    (width.min(height) / DOT_SCALE_DIVISOR).max(1) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::landmark::Landmark;

    fn black_frame(width: u32, height: u32) -> Frame {
        Frame::new(vec![0u8; (width * height * 3) as usize], width, height, 0)
    }

    fn mesh_at(points: &[(f32, f32)]) -> FaceMesh {
        let landmarks = points
            .iter()
            .map(|&(x, y)| Landmark::new(x, y, 0.0))
            .collect();
        FaceMesh::new(landmarks, 0.9)
    }

    #[test]
    fn test_annotate_marks_landmark_pixels() {
        let frame = black_frame(100, 100);
        let annotated = annotate(&frame, &[mesh_at(&[(50.0, 50.0)])]);
        assert_eq!(annotated.pixel(50, 50), [0, 220, 90]);
    }

    #[test]
    fn test_annotate_leaves_source_untouched() {
        let frame = black_frame(100, 100);
        let _ = annotate(&frame, &[mesh_at(&[(50.0, 50.0)])]);
        assert_eq!(frame.pixel(50, 50), [0, 0, 0]);
    }

    #[test]
    fn test_annotate_without_meshes_is_identity() {
        let frame = black_frame(60, 40);
        let annotated = annotate(&frame, &[]);
        assert_eq!(annotated.data(), frame.data());
        assert_eq!(annotated.width(), 60);
        assert_eq!(annotated.height(), 40);
    }

    #[test]
    fn test_annotate_skips_out_of_bounds_landmarks() {
        let frame = black_frame(50, 50);
        let meshes = [mesh_at(&[(-10.0, 25.0), (25.0, 500.0), (25.0, 25.0)])];
        let annotated = annotate(&frame, &meshes);
        // The in-bounds landmark is drawn, nothing panics
        assert_eq!(annotated.pixel(25, 25), [0, 220, 90]);
    }

    #[test]
    fn test_annotate_draws_all_faces() {
        let frame = black_frame(100, 100);
        let meshes = [mesh_at(&[(10.0, 10.0)]), mesh_at(&[(80.0, 80.0)])];
        let annotated = annotate(&frame, &meshes);
        assert_eq!(annotated.pixel(10, 10), [0, 220, 90]);
        assert_eq!(annotated.pixel(80, 80), [0, 220, 90]);
    }

    #[test]
    fn test_dot_radius_scales_with_frame() {
        assert_eq!(dot_radius(100, 100), 1);
        assert_eq!(dot_radius(800, 600), 2);
        assert_eq!(dot_radius(1920, 1080), 3);
    }

    #[test]
    fn test_annotate_keeps_frame_index() {
        let frame = Frame::new(vec![0u8; 30 * 30 * 3], 30, 30, 9);
        assert_eq!(annotate(&frame, &[]).index(), 9);
    }
}

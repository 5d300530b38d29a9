/// Short-range BlazeFace face finder using ONNX Runtime via `ort`.
///
/// First stage of the mesh pipeline: produces scored face boxes only.
/// Landmark work belongs to the mesh regressor.
use std::path::Path;

use crate::detection::domain::face_box::FaceBox;
use crate::shared::frame::Frame;

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f32 = 0.3;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

pub struct OnnxFaceFinder {
    session: ort::session::Session,
    confidence: f32,
    anchors: Vec<[f32; 2]>,
}

impl OnnxFaceFinder {
    /// Load the face-finder ONNX model.
    pub fn new(model_path: &Path, confidence: f32) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
        Ok(Self {
            session,
            confidence,
            anchors: generate_anchors(),
        })
    }

    /// Run one inference pass and return NMS-filtered boxes, best first.
    pub fn find(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        let fw = frame.width() as f32;
        let fh = frame.height() as f32;

        // 1. Preprocess: resize to 128x128, normalize to [0,1], NCHW
        let input_tensor = preprocess(frame, INPUT_SIZE);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // BlazeFace outputs two tensors:
        // - regressors: [1, 896, 16] (box deltas + keypoints)
        // - classificators: [1, 896, 1] (confidence logits)
        if outputs.len() < 2 {
            return Err(format!(
                "face finder expected 2 outputs, got {}",
                outputs.len()
            )
            .into());
        }

        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        // 3. Decode anchor boxes, gate on confidence
        let mut boxes = Vec::new();
        let num_anchors = self.anchors.len().min(NUM_ANCHORS).min(score_data.len());

        for (i, &logit) in score_data.iter().enumerate().take(num_anchors) {
            let score = sigmoid(logit);
            if score < self.confidence {
                continue;
            }

            let anchor = &self.anchors[i];
            let reg_offset = i * 16;
            if reg_offset + 4 > reg_data.len() {
                break;
            }

            // Box center + size are deltas relative to the anchor,
            // expressed in input-resolution pixels
            let cx = anchor[0] + reg_data[reg_offset] / INPUT_SIZE as f32;
            let cy = anchor[1] + reg_data[reg_offset + 1] / INPUT_SIZE as f32;
            let w = reg_data[reg_offset + 2] / INPUT_SIZE as f32;
            let h = reg_data[reg_offset + 3] / INPUT_SIZE as f32;

            boxes.push(FaceBox {
                x1: ((cx - w / 2.0) * fw).max(0.0),
                y1: ((cy - h / 2.0) * fh).max(0.0),
                x2: ((cx + w / 2.0) * fw).min(fw),
                y2: ((cy + h / 2.0) * fh).min(fh),
                score,
            });
        }

        // 4. NMS
        Ok(nms(boxes, NMS_IOU_THRESH))
    }
}

/// Resize frame to `size × size` and normalize to [0,1] NCHW float32.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    tensor
}

/// Generate BlazeFace anchors for the short-range model.
///
/// Two feature map sizes, 16×16 and 8×8, with 2 and 6 anchors per cell.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

/// Greedy NMS: sort by score descending, suppress overlapping boxes.
fn nms(mut boxes: Vec<FaceBox>, iou_thresh: f32) -> Vec<FaceBox> {
    boxes.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<FaceBox> = Vec::new();
    for candidate in boxes {
        let dominated = keep.iter().any(|k| k.iou(&candidate) > iou_thresh);
        if !dominated {
            keep.push(candidate);
        }
    }
    keep
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn face_box(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> FaceBox {
        FaceBox {
            x1,
            y1,
            x2,
            y2,
            score,
        }
    }

    #[test]
    fn test_anchor_count_matches_short_range_model() {
        let anchors = generate_anchors();
        // 16*16*2 + 8*8*6 = 512 + 384
        assert_eq!(anchors.len(), NUM_ANCHORS);
    }

    #[test]
    fn test_anchors_are_normalized_cell_centers() {
        let anchors = generate_anchors();
        for a in &anchors {
            assert!(a[0] > 0.0 && a[0] < 1.0);
            assert!(a[1] > 0.0 && a[1] < 1.0);
        }
        // First cell of the 16x16 grid
        assert_relative_eq!(anchors[0][0], 0.5 / 16.0);
        assert_relative_eq!(anchors[0][1], 0.5 / 16.0);
    }

    #[test]
    fn test_preprocess_shape_and_normalization() {
        let frame = Frame::new(vec![255u8; 64 * 32 * 3], 64, 32, 0);
        let tensor = preprocess(&frame, 128);
        assert_eq!(tensor.shape(), &[1, 3, 128, 128]);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 1.0);
        assert_relative_eq!(tensor[[0, 2, 127, 127]], 1.0);
    }

    #[test]
    fn test_preprocess_samples_source_pixels() {
        // Left half red, right half blue
        let mut data = vec![0u8; 8 * 4 * 3];
        for y in 0..4 {
            for x in 0..8 {
                let off = (y * 8 + x) * 3;
                if x < 4 {
                    data[off] = 255;
                } else {
                    data[off + 2] = 255;
                }
            }
        }
        let frame = Frame::new(data, 8, 4, 0);
        let tensor = preprocess(&frame, 16);
        // Left column: R channel 1.0; right column: B channel 1.0
        assert_relative_eq!(tensor[[0, 0, 8, 0]], 1.0);
        assert_relative_eq!(tensor[[0, 2, 8, 15]], 1.0);
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let boxes = vec![
            face_box(0.0, 0.0, 100.0, 100.0, 0.9),
            face_box(5.0, 5.0, 105.0, 105.0, 0.8),
        ];
        let kept = nms(boxes, NMS_IOU_THRESH);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_nms_keeps_distinct_faces() {
        let boxes = vec![
            face_box(0.0, 0.0, 50.0, 50.0, 0.9),
            face_box(200.0, 200.0, 250.0, 250.0, 0.8),
        ];
        assert_eq!(nms(boxes, NMS_IOU_THRESH).len(), 2);
    }

    #[test]
    fn test_nms_orders_by_score() {
        let boxes = vec![
            face_box(200.0, 200.0, 250.0, 250.0, 0.6),
            face_box(0.0, 0.0, 50.0, 50.0, 0.95),
        ];
        let kept = nms(boxes, NMS_IOU_THRESH);
        assert_relative_eq!(kept[0].score, 0.95);
        assert_relative_eq!(kept[1].score, 0.6);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(nms(Vec::new(), NMS_IOU_THRESH).is_empty());
    }

    #[test]
    fn test_sigmoid_range() {
        assert_relative_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }
}

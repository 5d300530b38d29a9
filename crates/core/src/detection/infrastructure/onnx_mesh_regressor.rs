/// 478-point face mesh regressor using ONNX Runtime via `ort`.
///
/// Second stage of the mesh pipeline: crops one found face to a padded
/// square, runs the landmark model on it, and maps the output back to
/// frame pixel coordinates.
use std::path::Path;

use crate::detection::domain::face_box::FaceBox;
use crate::detection::domain::landmark::{FaceMesh, Landmark};
use crate::shared::frame::Frame;

/// Mesh model input resolution.
const INPUT_SIZE: u32 = 192;

/// Padding around the face box on each side, as a fraction of its size.
const CROP_MARGIN: f32 = 0.25;

/// Coordinate values per landmark in the output tensor (x, y, z).
const VALUES_PER_LANDMARK: usize = 3;

pub struct OnnxMeshRegressor {
    session: ort::session::Session,
}

impl OnnxMeshRegressor {
    /// Load the mesh ONNX model.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
        Ok(Self { session })
    }

    /// Regress the landmark set for one face.
    pub fn regress(
        &mut self,
        frame: &Frame,
        face: &FaceBox,
    ) -> Result<FaceMesh, Box<dyn std::error::Error>> {
        let (crop_x, crop_y, side) = crop_region(face, frame.width(), frame.height());

        // 1. Preprocess: padded square crop → 192x192, [0,1], NCHW
        let input_tensor = preprocess_crop(frame, crop_x, crop_y, side, INPUT_SIZE);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // Mesh model outputs:
        // - landmarks: [1, 1434] (478 × x,y,z in input pixels)
        // - face flag: [1, 1] (presence logit)
        if outputs.len() < 2 {
            return Err(format!(
                "mesh model expected 2 outputs, got {}",
                outputs.len()
            )
            .into());
        }

        let raw = outputs[0].try_extract_array::<f32>()?;
        let flag = outputs[1].try_extract_array::<f32>()?;
        let raw_data = raw.as_slice().ok_or("Cannot get landmark slice")?;
        let flag_data = flag.as_slice().ok_or("Cannot get face flag slice")?;

        // 3. Map landmarks from crop coordinates back to the frame
        let landmarks = map_landmarks(raw_data, crop_x, crop_y, side, INPUT_SIZE);
        let score = sigmoid(*flag_data.first().unwrap_or(&f32::NEG_INFINITY));

        Ok(FaceMesh::new(landmarks, score))
    }
}

/// Padded square crop around the face, shifted (and if necessary shrunk)
/// to stay inside the frame. Returns `(x, y, side)` in frame pixels.
fn crop_region(face: &FaceBox, frame_w: u32, frame_h: u32) -> (u32, u32, u32) {
    let fw = frame_w as f32;
    let fh = frame_h as f32;
    let (cx, cy) = face.center();

    let side = (face.width().max(face.height()) * (1.0 + 2.0 * CROP_MARGIN))
        .min(fw)
        .min(fh)
        .max(1.0);

    let x = (cx - side / 2.0).clamp(0.0, fw - side);
    let y = (cy - side / 2.0).clamp(0.0, fh - side);

    (x as u32, y as u32, side as u32)
}

/// Sample the crop into a `size × size` [0,1] NCHW tensor.
fn preprocess_crop(frame: &Frame, crop_x: u32, crop_y: u32, side: u32, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = (crop_y as usize + ((y as f64 + 0.5) * side as f64 / s as f64) as usize)
            .min(src_h - 1);
        for x in 0..s {
            let src_x = (crop_x as usize + ((x as f64 + 0.5) * side as f64 / s as f64) as usize)
                .min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    tensor
}

/// Map raw model output (x, y, z triples in input pixels) to frame pixels.
fn map_landmarks(raw: &[f32], crop_x: u32, crop_y: u32, side: u32, input_size: u32) -> Vec<Landmark> {
    let scale = side as f32 / input_size as f32;
    raw.chunks_exact(VALUES_PER_LANDMARK)
        .map(|triple| {
            Landmark::new(
                crop_x as f32 + triple[0] * scale,
                crop_y as f32 + triple[1] * scale,
                triple[2] * scale,
            )
        })
        .collect()
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

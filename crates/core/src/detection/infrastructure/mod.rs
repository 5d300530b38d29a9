pub mod model_resolver;
pub mod onnx_face_finder;
pub mod onnx_mesh_detector;
pub mod onnx_mesh_regressor;

pub mod detection_summary;
pub mod face_box;
pub mod landmark;
pub mod mesh_detector;

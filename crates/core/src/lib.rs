//! Face landmark detection library: image adapter, ONNX mesh detector
//! facade, overlay rendering, and the live-stream machinery shared by the
//! CLI and the web front-end.

pub mod detection;
pub mod imaging;
pub mod overlay;
pub mod pipeline;
pub mod shared;
pub mod stream;

pub mod camera;
pub mod frame_source;
pub mod live_session;

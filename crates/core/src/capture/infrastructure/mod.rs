pub mod synthetic_capture_backend;
pub mod threaded_capture_session;

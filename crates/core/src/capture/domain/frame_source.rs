use crate::capture::domain::camera_error::CameraError;
use crate::capture::domain::capture_device::{CaptureFormat, DeviceDescriptor, Facing};
use crate::shared::frame::FrameBuffer;

/// Lifecycle of a capture session.
///
/// `Configuring` covers both an in-flight `configure` and a committed
/// configuration that has not been started yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Configuring,
    Running,
    Paused,
    Stopped,
}

/// Consumer of delivered frames. Runs on the frame-delivery worker, one
/// frame at a time.
pub type FrameCallback = Box<dyn FnMut(FrameBuffer) + Send>;

/// Owns the camera lifecycle and delivers frames to a single consumer.
///
/// `start`, `pause`, `resume` and `stop` are idempotent: repeating a call
/// that already took effect is a logged no-op.
pub trait FrameSource: Send {
    /// Resolves permission, picks a device and a format, and commits the
    /// configuration. Does not return before permission is resolved.
    fn configure(&mut self, facing: Facing) -> Result<(), CameraError>;

    /// Must be set before the first `start`.
    fn set_on_frame(&mut self, callback: FrameCallback);

    fn start(&mut self) -> Result<(), CameraError>;

    /// Stops delivery. A frame already being processed is allowed to finish.
    fn pause(&mut self);

    fn resume(&mut self) -> Result<(), CameraError>;

    /// Stops delivery and always releases the device input.
    fn stop(&mut self);

    fn state(&self) -> SessionState;

    fn active_device(&self) -> Option<&DeviceDescriptor>;

    fn negotiated_format(&self) -> Option<&CaptureFormat>;

    /// Frames discarded by the late-frame policy since the session was created.
    fn dropped_frames(&self) -> u64;
}

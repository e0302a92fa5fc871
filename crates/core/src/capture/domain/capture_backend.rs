use crate::capture::domain::camera_error::CameraError;
use crate::capture::domain::capture_device::{CaptureFormat, DeviceDescriptor, Facing};
use crate::capture::domain::frame_sink::FrameSink;

/// Called exactly once with the user's answer. May run on any thread,
/// before or after `request_permission` returns.
pub type PermissionCallback = Box<dyn FnOnce(bool) + Send>;

/// Platform camera access: the only layer that talks to real hardware.
///
/// The capture session drives this port; it never exposes it to the
/// pipeline or the UI.
pub trait CaptureBackend: Send {
    fn request_permission(&mut self, on_resolved: PermissionCallback);

    fn discover_devices(&self, facing: Facing) -> Vec<DeviceDescriptor>;

    fn supported_formats(&self, device: &DeviceDescriptor) -> Vec<CaptureFormat>;

    /// Binds the device as the session input with the negotiated format.
    fn attach_input(
        &mut self,
        device: &DeviceDescriptor,
        format: &CaptureFormat,
    ) -> Result<(), CameraError>;

    /// Releases the device input. Safe to call when nothing is attached.
    fn detach_input(&mut self);

    /// Begins pushing frames into `sink`. Returns without waiting for the
    /// first frame.
    fn start_stream(&mut self, sink: FrameSink) -> Result<(), CameraError>;

    /// Stops pushing frames. Safe to call when not streaming.
    fn stop_stream(&mut self);
}

use thiserror::Error;

use crate::capture::domain::capture_device::Facing;
use crate::capture::domain::frame_source::SessionState;

/// Setup failures. Fatal to starting the pipeline and never retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("no {0} camera available")]
    NoDeviceAvailable(Facing),
    #[error("camera access denied")]
    PermissionDenied,
    #[error("camera {device} reports no capture formats")]
    NoSupportedFormat { device: String },
    #[error("cannot attach camera input: {0}")]
    DeviceInput(String),
    #[error("cannot {action} while the capture session is {state:?}")]
    InvalidState {
        action: &'static str,
        state: SessionState,
    },
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::frame::PixelFormat;

/// Which side of the device the camera looks out of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Front,
    Back,
}

impl Facing {
    /// Front cameras are previewed as a mirror image.
    pub fn is_mirrored(self) -> bool {
        matches!(self, Facing::Front)
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facing::Front => write!(f, "front"),
            Facing::Back => write!(f, "back"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub id: String,
    pub name: String,
    pub facing: Facing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureFormat {
    pub width: u32,
    pub height: u32,
    pub max_fps: f64,
    pub pixel_format: PixelFormat,
}

impl CaptureFormat {
    pub fn matches(&self, (width, height): (u32, u32)) -> bool {
        self.width == width && self.height == height
    }
}

impl fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:4}x{:<4} | {:2.0} FPS | {:?}",
            self.width, self.height, self.max_fps, self.pixel_format
        )
    }
}

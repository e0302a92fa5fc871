use std::time::Instant;

use image::{Rgb, RgbImage};
use thiserror::Error;

/// Pixel layouts a capture device may deliver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgb8,
    Bgra8,
    /// Bi-planar YUV 4:2:0. Delivered by some sensors, not consumed by the engine.
    Nv12,
}

impl PixelFormat {
    /// Byte length of a tightly packed buffer of this format.
    pub fn buffer_len(self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        match self {
            PixelFormat::Rgb8 => pixels * 3,
            PixelFormat::Bgra8 => pixels * 4,
            PixelFormat::Nv12 => pixels + pixels / 2,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameConversionError {
    #[error("pixel format {0:?} cannot be converted to RGB")]
    Unsupported(PixelFormat),
    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    Truncated { expected: usize, actual: usize },
}

/// One decoded camera frame.
///
/// Not `Clone`: a frame has exactly one owner at a time, from
/// the capture backend through the delivery worker into the pipeline, which
/// consumes it on conversion.
#[derive(Debug)]
pub struct FrameBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    sequence: u64,
    captured_at: Instant,
}

impl FrameBuffer {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat, sequence: u64) -> Self {
        Self {
            data,
            width,
            height,
            format,
            sequence,
            captured_at: Instant::now(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// Consumes the frame and produces the packed RGB image the engine expects.
    pub fn into_rgb(self) -> Result<RgbImage, FrameConversionError> {
        let expected = self.format.buffer_len(self.width, self.height);
        if self.data.len() != expected {
            return Err(FrameConversionError::Truncated {
                expected,
                actual: self.data.len(),
            });
        }

        match self.format {
            PixelFormat::Rgb8 => RgbImage::from_raw(self.width, self.height, self.data).ok_or(
                FrameConversionError::Truncated {
                    expected,
                    actual: 0,
                },
            ),
            PixelFormat::Bgra8 => {
                let width = self.width;
                let data = self.data;
                Ok(RgbImage::from_fn(self.width, self.height, |x, y| {
                    let i = ((y * width + x) * 4) as usize;
                    Rgb([data[i + 2], data[i + 1], data[i]])
                }))
            }
            PixelFormat::Nv12 => Err(FrameConversionError::Unsupported(self.format)),
        }
    }
}

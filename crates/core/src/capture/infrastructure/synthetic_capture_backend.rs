use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::capture::domain::camera_error::CameraError;
use crate::capture::domain::capture_backend::{CaptureBackend, PermissionCallback};
use crate::capture::domain::capture_device::{CaptureFormat, DeviceDescriptor, Facing};
use crate::capture::domain::frame_sink::FrameSink;
use crate::shared::frame::{FrameBuffer, PixelFormat};

/// Software camera that renders numbered frames at a fixed interval.
///
/// Every byte of frame `n` holds `n % 256`, which lets a scripted engine
/// recover the frame number from pixel data alone.
pub struct SyntheticCaptureBackend {
    devices: Vec<DeviceDescriptor>,
    formats: Vec<CaptureFormat>,
    grant_permission: bool,
    frame_interval: Duration,
    attached: Option<CaptureFormat>,
    next_sequence: u64,
    stream: Option<StreamThread>,
}

struct StreamThread {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<u64>,
}

impl SyntheticCaptureBackend {
    pub fn new() -> Self {
        Self {
            devices: vec![
                DeviceDescriptor {
                    id: "synthetic-front".into(),
                    name: "Synthetic Front Camera".into(),
                    facing: Facing::Front,
                },
                DeviceDescriptor {
                    id: "synthetic-back".into(),
                    name: "Synthetic Back Camera".into(),
                    facing: Facing::Back,
                },
            ],
            formats: vec![
                format(640, 480, 30.0),
                format(1280, 720, 30.0),
                format(1920, 1080, 30.0),
            ],
            grant_permission: true,
            frame_interval: Duration::from_millis(33),
            attached: None,
            next_sequence: 0,
            stream: None,
        }
    }

    pub fn with_formats(mut self, formats: Vec<CaptureFormat>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_permission(mut self, granted: bool) -> Self {
        self.grant_permission = granted;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }
}

impl Default for SyntheticCaptureBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for SyntheticCaptureBackend {
    fn request_permission(&mut self, on_resolved: PermissionCallback) {
        let granted = self.grant_permission;
        std::thread::spawn(move || on_resolved(granted));
    }

    fn discover_devices(&self, facing: Facing) -> Vec<DeviceDescriptor> {
        self.devices
            .iter()
            .filter(|d| d.facing == facing)
            .cloned()
            .collect()
    }

    fn supported_formats(&self, _device: &DeviceDescriptor) -> Vec<CaptureFormat> {
        self.formats.clone()
    }

    fn attach_input(
        &mut self,
        device: &DeviceDescriptor,
        format: &CaptureFormat,
    ) -> Result<(), CameraError> {
        if !self.devices.contains(device) {
            return Err(CameraError::DeviceInput(format!(
                "unknown device {}",
                device.id
            )));
        }
        self.attached = Some(*format);
        Ok(())
    }

    fn detach_input(&mut self) {
        self.stop_stream();
        self.attached = None;
    }

    fn start_stream(&mut self, sink: FrameSink) -> Result<(), CameraError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let format = self
            .attached
            .ok_or_else(|| CameraError::DeviceInput("no input attached".into()))?;
        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = stop.clone();
        let interval = self.frame_interval;
        let first = self.next_sequence;

        let handle = std::thread::spawn(move || {
            let mut sequence = first;
            while !stop_thread.load(Ordering::Acquire) {
                if !sink.push(render(&format, sequence)) {
                    break;
                }
                sequence += 1;
                std::thread::sleep(interval);
            }
            sequence
        });

        self.stream = Some(StreamThread { stop, handle });
        Ok(())
    }

    fn stop_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop.store(true, Ordering::Release);
            match stream.handle.join() {
                Ok(next) => self.next_sequence = next,
                Err(_) => log::error!("Synthetic stream thread panicked"),
            }
        }
    }
}

impl Drop for SyntheticCaptureBackend {
    fn drop(&mut self) {
        self.stop_stream();
    }
}

fn format(width: u32, height: u32, max_fps: f64) -> CaptureFormat {
    CaptureFormat {
        width,
        height,
        max_fps,
        pixel_format: PixelFormat::Bgra8,
    }
}

fn render(format: &CaptureFormat, sequence: u64) -> FrameBuffer {
    let len = format.pixel_format.buffer_len(format.width, format.height);
    FrameBuffer::new(
        vec![(sequence % 256) as u8; len],
        format.width,
        format.height,
        format.pixel_format,
        sequence,
    )
}

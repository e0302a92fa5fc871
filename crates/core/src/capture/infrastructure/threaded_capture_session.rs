use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{select, Sender};

use crate::capture::domain::camera_error::CameraError;
use crate::capture::domain::capture_backend::CaptureBackend;
use crate::capture::domain::capture_device::{CaptureFormat, DeviceDescriptor, Facing};
use crate::capture::domain::format_selector::select_format;
use crate::capture::domain::frame_sink::{frame_mailbox, FrameMailbox, FrameSink};
use crate::capture::domain::frame_source::{FrameCallback, FrameSource, SessionState};
use crate::shared::constants::{LOG_INTERVAL_SECS, PREFERRED_RESOLUTIONS};
use crate::shared::log_throttle::LogThrottle;

/// Capture session with a dedicated frame-delivery worker thread.
///
/// Layout: `backend → FrameSink [1 slot] → delivery worker → on_frame`
///
/// The worker handles one frame at a time; frames arriving meanwhile
/// replace each other in the single slot, so backlog never exceeds one.
pub struct ThreadedCaptureSession<B: CaptureBackend> {
    backend: B,
    state: SessionState,
    committed: bool,
    device: Option<DeviceDescriptor>,
    format: Option<CaptureFormat>,
    preferred_resolutions: Vec<(u32, u32)>,
    on_frame: Option<FrameCallback>,
    worker: Option<DeliveryWorker>,
    dropped_total: u64,
    drop_log: LogThrottle,
}

struct DeliveryWorker {
    sink: FrameSink,
    delivering: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    shutdown_tx: Sender<()>,
    handle: JoinHandle<FrameCallback>,
}

impl<B: CaptureBackend> ThreadedCaptureSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: SessionState::Idle,
            committed: false,
            device: None,
            format: None,
            preferred_resolutions: PREFERRED_RESOLUTIONS.to_vec(),
            on_frame: None,
            worker: None,
            dropped_total: 0,
            drop_log: LogThrottle::new(Duration::from_secs(LOG_INTERVAL_SECS)),
        }
    }

    pub fn with_preferred_resolutions(mut self, preferred: Vec<(u32, u32)>) -> Self {
        self.preferred_resolutions = preferred;
        self
    }

    /// Minimum spacing between dropped-frame reports.
    pub fn with_log_interval(mut self, interval: Duration) -> Self {
        self.drop_log = LogThrottle::new(interval);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Blocks until the backend resolves the permission request. A backend
    /// that drops the callback without answering counts as a refusal.
    fn await_permission(&mut self) -> bool {
        let (tx, rx) = crossbeam_channel::bounded::<bool>(1);
        self.backend.request_permission(Box::new(move |granted| {
            let _ = tx.send(granted);
        }));
        let granted = rx.recv().unwrap_or(false);
        log::info!("Camera access granted: {granted}");
        granted
    }

    fn configure_device(&mut self, facing: Facing) -> Result<(), CameraError> {
        if !self.await_permission() {
            return Err(CameraError::PermissionDenied);
        }

        let devices = self.backend.discover_devices(facing);
        log::debug!(
            "Available {facing} devices: {:?}",
            devices.iter().map(|d| d.name.as_str()).collect::<Vec<_>>()
        );
        let device = devices
            .into_iter()
            .next()
            .ok_or(CameraError::NoDeviceAvailable(facing))?;

        let formats = self.backend.supported_formats(&device);
        log::debug!("Formats offered by {}:", device.name);
        for format in &formats {
            log::debug!("  {format}");
        }
        let format = match select_format(&formats, &self.preferred_resolutions) {
            Some(format) => format,
            None => {
                return Err(CameraError::NoSupportedFormat {
                    device: device.name.clone(),
                })
            }
        };
        if !self
            .preferred_resolutions
            .iter()
            .any(|&r| format.matches(r))
        {
            log::warn!("No preferred format on {}, using {format}", device.name);
        }

        self.backend.attach_input(&device, &format)?;
        log::info!("Capture configured: {} @ {format}", device.name);
        self.device = Some(device);
        self.format = Some(format);
        Ok(())
    }

    fn release_input(&mut self) {
        self.backend.detach_input();
        self.device = None;
        self.format = None;
        self.committed = false;
    }

    fn begin_streaming(&mut self) -> Result<(), CameraError> {
        let worker = match self.worker.take() {
            Some(worker) => worker,
            None => {
                let callback = self.on_frame.take().ok_or(CameraError::InvalidState {
                    action: "start without a frame consumer",
                    state: self.state,
                })?;
                spawn_delivery_worker(callback).map_err(delivery_spawn_error)?
            }
        };
        let sink = worker.sink.clone();
        let delivering = worker.delivering.clone();
        self.worker = Some(worker);

        delivering.store(true, Ordering::Release);
        if let Err(e) = self.backend.start_stream(sink) {
            delivering.store(false, Ordering::Release);
            return Err(e);
        }
        self.state = SessionState::Running;
        Ok(())
    }

    fn halt_streaming(&mut self) {
        if let Some(worker) = &self.worker {
            worker.delivering.store(false, Ordering::Release);
            self.backend.stop_stream();
            worker.sink.discard_pending();
        } else {
            self.backend.stop_stream();
        }
    }

    fn shutdown_worker(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.dropped_total += worker.dropped.load(Ordering::Relaxed);
        let _ = worker.shutdown_tx.send(());
        match worker.handle.join() {
            Ok(callback) => {
                if self.on_frame.is_none() {
                    self.on_frame = Some(callback);
                }
            }
            Err(_) => log::error!("Frame delivery thread panicked"),
        }
    }

    fn log_drops(&mut self) {
        let dropped = self.dropped_frames();
        if dropped > 0 && self.drop_log.should_log() {
            log::debug!("Late-frame policy has dropped {dropped} frames");
        }
    }
}

impl<B: CaptureBackend> FrameSource for ThreadedCaptureSession<B> {
    fn configure(&mut self, facing: Facing) -> Result<(), CameraError> {
        match self.state {
            SessionState::Running | SessionState::Paused => {
                return Err(CameraError::InvalidState {
                    action: "configure",
                    state: self.state,
                })
            }
            _ => {}
        }
        if self.committed {
            if self.device.as_ref().is_some_and(|d| d.facing == facing) {
                log::debug!("Capture already configured for {facing} camera");
                return Ok(());
            }
            self.release_input();
        }

        self.state = SessionState::Configuring;
        match self.configure_device(facing) {
            Ok(()) => {
                self.committed = true;
                Ok(())
            }
            Err(e) => {
                log::error!("Capture configuration failed: {e}");
                self.release_input();
                self.state = SessionState::Idle;
                Err(e)
            }
        }
    }

    fn set_on_frame(&mut self, callback: FrameCallback) {
        if self.worker.is_some() {
            log::warn!("Frame consumer replaced while the delivery worker is alive");
        }
        self.on_frame = Some(callback);
    }

    fn start(&mut self) -> Result<(), CameraError> {
        match self.state {
            SessionState::Running => {
                log::debug!("Capture session is already running");
                Ok(())
            }
            SessionState::Paused => self.resume(),
            SessionState::Configuring if self.committed => {
                self.begin_streaming()?;
                log::info!("Capture session started");
                Ok(())
            }
            state => Err(CameraError::InvalidState {
                action: "start",
                state,
            }),
        }
    }

    fn pause(&mut self) {
        if self.state != SessionState::Running {
            log::debug!("Capture session is not running; pause has no effect");
            return;
        }
        self.halt_streaming();
        self.state = SessionState::Paused;
        self.log_drops();
        log::info!("Capture session paused");
    }

    fn resume(&mut self) -> Result<(), CameraError> {
        match self.state {
            SessionState::Running => {
                log::debug!("Capture session is already running; resume has no effect");
                Ok(())
            }
            SessionState::Paused => {
                self.begin_streaming()?;
                log::info!("Capture session resumed");
                Ok(())
            }
            state => Err(CameraError::InvalidState {
                action: "resume",
                state,
            }),
        }
    }

    fn stop(&mut self) {
        match self.state {
            SessionState::Stopped => {
                log::debug!("Capture session is already stopped");
                return;
            }
            SessionState::Running => self.halt_streaming(),
            _ => {}
        }
        self.shutdown_worker();
        self.release_input();
        self.state = SessionState::Stopped;
        log::info!(
            "Capture session stopped ({} late frames dropped)",
            self.dropped_total
        );
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn active_device(&self) -> Option<&DeviceDescriptor> {
        self.device.as_ref()
    }

    fn negotiated_format(&self) -> Option<&CaptureFormat> {
        self.format.as_ref()
    }

    fn dropped_frames(&self) -> u64 {
        self.dropped_total
            + self
                .worker
                .as_ref()
                .map_or(0, |w| w.dropped.load(Ordering::Relaxed))
    }
}

impl<B: CaptureBackend> Drop for ThreadedCaptureSession<B> {
    fn drop(&mut self) {
        if self.state != SessionState::Stopped && self.state != SessionState::Idle {
            self.stop();
        } else {
            self.shutdown_worker();
        }
    }
}

fn spawn_delivery_worker(mut callback: FrameCallback) -> std::io::Result<DeliveryWorker> {
    let (sink, mailbox) = frame_mailbox();
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
    let delivering = Arc::new(AtomicBool::new(false));
    let dropped = mailbox.dropped_counter();
    let delivering_worker = delivering.clone();

    let handle = std::thread::Builder::new()
        .name("frame-delivery".into())
        .spawn(move || {
            run_delivery_loop(&mailbox, &shutdown_rx, &delivering_worker, &mut callback);
            mailbox.close();
            callback
        })?;

    Ok(DeliveryWorker {
        sink,
        delivering,
        dropped,
        shutdown_tx,
        handle,
    })
}

fn delivery_spawn_error(e: std::io::Error) -> CameraError {
    CameraError::DeviceInput(format!("cannot start frame delivery: {e}"))
}

fn run_delivery_loop(
    mailbox: &FrameMailbox,
    shutdown_rx: &crossbeam_channel::Receiver<()>,
    delivering: &AtomicBool,
    callback: &mut FrameCallback,
) {
    loop {
        select! {
            recv(mailbox.receiver()) -> frame => match frame {
                Ok(frame) if delivering.load(Ordering::Acquire) => callback(frame),
                Ok(frame) => {
                    log::trace!("Discarding frame #{} delivered while paused", frame.sequence())
                }
                Err(_) => break,
            },
            recv(shutdown_rx) -> _ => break,
        }
    }
}

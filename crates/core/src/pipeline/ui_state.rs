use std::time::Duration;

use crate::overlay::domain::coordinate_transformer::CoordinateTransformer;
use crate::overlay::domain::overlay_renderer::{OverlayCategory, OverlayRenderer, ShapeId};
use crate::pipeline::frame_observer::FrameObserver;
use crate::pipeline::modes::enroll_mode::EnrollPanel;
use crate::shared::log_throttle::LogThrottle;
use crate::shared::rect::Size;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LabelColor {
    #[default]
    Default,
    Green,
    Red,
    White,
}

/// The status text shown under the preview.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusLabel {
    pub text: String,
    pub color: LabelColor,
}

impl StatusLabel {
    pub fn set(&mut self, text: impl Into<String>, color: LabelColor) {
        self.text = text.into();
        self.color = color;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.color = LabelColor::Default;
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Where a frame came from, as needed to place its boxes on the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameGeometry {
    pub source: Size,
    pub mirrored: bool,
}

/// Everything user-facing. Lives on the UI context and is only ever
/// touched by tasks running there.
pub struct UiState {
    pub renderer: OverlayRenderer,
    pub status: StatusLabel,
    pub enroll: EnrollPanel,
    surface_bounds: Size,
    observer: Option<Box<dyn FrameObserver>>,
    epoch: u64,
    frames_reported: u64,
    bounds_log: LogThrottle,
}

impl UiState {
    pub fn new(
        renderer: OverlayRenderer,
        surface_bounds: Size,
        observer: Option<Box<dyn FrameObserver>>,
        log_interval: Duration,
    ) -> Self {
        Self {
            renderer,
            status: StatusLabel::default(),
            enroll: EnrollPanel::default(),
            surface_bounds,
            observer,
            epoch: 0,
            frames_reported: 0,
            bounds_log: LogThrottle::new(log_interval),
        }
    }

    pub fn surface_bounds(&self) -> Size {
        self.surface_bounds
    }

    pub fn set_surface_bounds(&mut self, bounds: Size) {
        if self.bounds_log.should_log() {
            log::debug!(
                "Surface bounds {}x{} -> {}x{}",
                self.surface_bounds.width,
                self.surface_bounds.height,
                bounds.width,
                bounds.height
            );
        }
        self.surface_bounds = bounds;
    }

    pub fn transformer(&self, geometry: FrameGeometry) -> CoordinateTransformer {
        CoordinateTransformer::new(geometry.source, self.surface_bounds, geometry.mirrored)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Frames whose report reached the UI since the state was created.
    pub fn frames_reported(&self) -> u64 {
        self.frames_reported
    }

    pub(crate) fn record_frame(&mut self) -> Option<&mut (dyn FrameObserver + 'static)> {
        self.frames_reported += 1;
        self.observer.as_deref_mut()
    }

    /// Clears every user-facing trace of the previous activation and
    /// adopts `epoch`, after which reports from older epochs are ignored.
    pub fn reset(&mut self, epoch: u64) {
        self.renderer.hide(ShapeId::FACE);
        self.renderer.remove_all(OverlayCategory::Objects);
        self.status.clear();
        self.enroll.clear();
        self.epoch = epoch;
    }
}

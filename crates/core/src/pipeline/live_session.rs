use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::capture::domain::camera_error::CameraError;
use crate::capture::domain::frame_source::{FrameSource, SessionState};
use crate::detection::domain::detection_engine::DetectionEngine;
use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::overlay::domain::overlay_surface::OverlaySurface;
use crate::pipeline::frame_observer::FrameObserver;
use crate::pipeline::frame_pipeline::{
    FramePipeline, PipelineControls, PipelineStats, StatsSnapshot,
};
use crate::pipeline::manage_identities_use_case::ManageIdentitiesUseCase;
use crate::pipeline::mode_controller::build_mode;
use crate::pipeline::modes::enroll_mode::{confirm_enrollment, EnrollOutcome};
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::pipeline::ui_context::UiContext;
use crate::pipeline::ui_state::UiState;
use crate::shared::pipeline_settings::{Mode, PipelineSettings};
use crate::shared::rect::Size;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error("cannot start UI context: {0}")]
    UiContext(#[from] std::io::Error),
}

/// Composition root for one live preview screen.
///
/// Owns the frame source, the UI context and the controls shared with the
/// frame pipeline, which itself lives inside the source's frame callback.
/// Activation changes start a new epoch so nothing from the previous
/// activation survives into the next.
pub struct LiveSession<S: FrameSource> {
    // Dropped first: stopping the source joins the worker holding the pipeline.
    source: S,
    ui: UiContext,
    engine: Arc<dyn DetectionEngine>,
    controls: Arc<PipelineControls>,
    stats: Arc<PipelineStats>,
    settings: PipelineSettings,
}

impl<S: FrameSource> LiveSession<S> {
    /// Configures the source and wires the pipeline. Frames flow only
    /// after [`activate`](Self::activate).
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        mut source: S,
        engine: Arc<dyn DetectionEngine>,
        settings: PipelineSettings,
        surface: Box<dyn OverlaySurface>,
        surface_bounds: Size,
        observer: Option<Box<dyn FrameObserver>>,
        logger: Option<Box<dyn PipelineLogger>>,
    ) -> Result<Self, SessionError> {
        source.configure(settings.facing)?;
        if let Some(format) = source.negotiated_format() {
            log::info!("Live session: {} mode on {format}", settings.mode);
        }

        let log_interval = Duration::from_secs(settings.log_interval_secs);
        let state = UiState::new(
            OverlayRenderer::new(surface),
            surface_bounds,
            observer,
            log_interval,
        );
        let ui = UiContext::spawn(state)?;

        let controls = Arc::new(PipelineControls::new(settings.object_detection_enabled));
        let stats = Arc::new(PipelineStats::default());
        let mirrored = source
            .active_device()
            .map_or(settings.facing, |d| d.facing)
            .is_mirrored();
        let mut pipeline = FramePipeline::new(
            engine.clone(),
            build_mode(&settings),
            controls.clone(),
            stats.clone(),
            ui.handle(),
            logger.unwrap_or_else(|| Box::new(NullPipelineLogger)),
            mirrored,
            settings.face_score_threshold,
            log_interval,
        );
        source.set_on_frame(Box::new(move |frame| {
            pipeline.process(frame);
        }));

        Ok(Self {
            source,
            ui,
            engine,
            controls,
            stats,
            settings,
        })
    }

    /// Starts or resumes frame delivery with a clean slate.
    pub fn activate(&mut self) -> Result<(), CameraError> {
        self.begin_epoch();
        self.source.start()
    }

    /// Stops frame delivery and clears everything shown. A frame still in
    /// flight finishes but its result is dropped.
    pub fn deactivate(&mut self) {
        self.source.pause();
        self.begin_epoch();
    }

    fn begin_epoch(&self) {
        let epoch = self.controls.advance_epoch();
        log::debug!("Live session epoch {epoch}");
        self.ui.handle().dispatch(move |ui| ui.reset(epoch));
    }

    pub fn is_active(&self) -> bool {
        self.source.state() == SessionState::Running
    }

    pub fn mode(&self) -> Mode {
        self.settings.mode
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Takes effect from the next frame the worker picks up.
    pub fn set_object_detection(&mut self, enabled: bool) {
        self.controls.set_object_detection(enabled);
        self.settings.object_detection_enabled = enabled;
    }

    pub fn set_surface_bounds(&self, bounds: Size) {
        self.ui
            .handle()
            .dispatch(move |ui| ui.set_surface_bounds(bounds));
    }

    /// Enrolls the currently held face under `name`. Runs on the UI
    /// context; `None` if it has shut down.
    pub fn confirm_enrollment(&mut self, name: &str) -> Option<EnrollOutcome> {
        let engine = self.engine.clone();
        let collection = self.settings.collection.clone();
        let name = name.to_string();
        self.ui.query(move |ui| {
            confirm_enrollment(&mut ui.enroll, &name, engine.as_ref(), &collection)
        })
    }

    pub fn identities(&self) -> ManageIdentitiesUseCase {
        ManageIdentitiesUseCase::new(self.engine.clone())
    }

    /// Reads UI state after every report posted so far has been applied.
    pub fn query<R, F>(&mut self, f: F) -> Option<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut UiState) -> R + Send + 'static,
    {
        self.ui.query(f)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Frames replaced by the late-frame policy before reaching the pipeline.
    pub fn dropped_frames(&self) -> u64 {
        self.source.dropped_frames()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Stops the source, flushes the UI context and returns its final state.
    pub fn shutdown(mut self) -> Option<UiState> {
        self.source.stop();
        let Self { ui, .. } = self;
        ui.shutdown()
    }
}
